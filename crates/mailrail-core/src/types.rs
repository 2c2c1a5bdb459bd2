//! Value types exchanged between the DNS and email-delivery ports

use serde::{Deserialize, Serialize};

/// DNS record types used for email domain setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    Mx,
    Txt,
    Cname,
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsRecordType::Mx => write!(f, "MX"),
            DnsRecordType::Txt => write!(f, "TXT"),
            DnsRecordType::Cname => write!(f, "CNAME"),
        }
    }
}

impl std::str::FromStr for DnsRecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MX" => Ok(DnsRecordType::Mx),
            "TXT" => Ok(DnsRecordType::Txt),
            "CNAME" => Ok(DnsRecordType::Cname),
            other => Err(format!("unsupported DNS record type: {}", other)),
        }
    }
}

/// DNS record required by the email-delivery provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// DNS record name (host), relative or fully qualified
    pub name: String,
    /// Record type: MX, TXT or CNAME
    pub record_type: DnsRecordType,
    /// DNS record value
    pub value: String,
    /// Priority (for MX records)
    pub priority: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_display() {
        assert_eq!(DnsRecordType::Mx.to_string(), "MX");
        assert_eq!(DnsRecordType::Txt.to_string(), "TXT");
        assert_eq!(DnsRecordType::Cname.to_string(), "CNAME");
    }

    #[test]
    fn test_record_type_from_str() {
        assert_eq!("MX".parse::<DnsRecordType>().unwrap(), DnsRecordType::Mx);
        assert_eq!("txt".parse::<DnsRecordType>().unwrap(), DnsRecordType::Txt);
        assert_eq!(
            "Cname".parse::<DnsRecordType>().unwrap(),
            DnsRecordType::Cname
        );
        assert!("ALIAS".parse::<DnsRecordType>().is_err());
    }

    #[test]
    fn test_record_serde_uses_uppercase_types() {
        let record = DnsRecord {
            name: "demo.example.com".to_string(),
            record_type: DnsRecordType::Mx,
            value: "mxa.mailgun.org".to_string(),
            priority: Some(10),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"MX\""));

        let parsed: DnsRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
