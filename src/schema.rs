//! Msgpack payload schemas for the two inbound package types
//!
//! Decoding is strict: a missing required field or a wrongly-typed one is an
//! error, never a silent default. Optional fields decode to `None`, so an
//! omitted field stays distinguishable from an explicitly empty one; whether
//! an empty value is acceptable is the dispatcher's call, not the codec's.

use serde::Deserialize;

/// Module configuration payload
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// SMTP server, `hostname[:port]`
    pub host: String,
    /// Optional `[username, password]` pair
    #[serde(default)]
    pub auth: Option<Vec<String>>,
}

/// Send-mail request payload
///
/// The accepted wire contract nests the optional message fields under a
/// `mail` key next to the recipient list:
///
/// ```text
/// { to: ["a@x.com", ...], mail: { subject: "...", plain: "...", ... } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MailRequest {
    /// Recipient addresses; must be non-empty to dispatch
    pub to: Vec<String>,
    /// The nested message fields
    #[serde(default)]
    pub mail: Option<MailFields>,
}

/// The nested message fields of a [`MailRequest`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailFields {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub plain: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub cc: Option<Vec<String>>,
    #[serde(default)]
    pub bcc: Option<Vec<String>>,
}

/// Decode a configuration payload
///
/// # Errors
///
/// Returns an error for malformed msgpack, a missing `host`, or
/// wrongly-typed fields
pub fn decode_config(data: &[u8]) -> Result<ModuleConfig, rmp_serde::decode::Error> {
    rmp_serde::from_slice(data)
}

/// Decode a send-mail request payload
///
/// # Errors
///
/// Returns an error for malformed msgpack, a missing `to`, or
/// wrongly-typed fields
pub fn decode_request(data: &[u8]) -> Result<MailRequest, rmp_serde::decode::Error> {
    rmp_serde::from_slice(data)
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    fn pack<T: Serialize>(value: &T) -> Vec<u8> {
        rmp_serde::to_vec_named(value).unwrap()
    }

    #[derive(Serialize)]
    struct Conf<'a> {
        host: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        auth: Option<Vec<&'a str>>,
    }

    #[test]
    fn config_with_auth() {
        let bytes = pack(&Conf {
            host: "smtp.example.com:587",
            auth: Some(vec!["user", "pass"]),
        });
        let config = decode_config(&bytes).unwrap();
        assert_eq!(config.host, "smtp.example.com:587");
        assert_eq!(config.auth.as_deref(), Some(&["user".to_string(), "pass".to_string()][..]));
    }

    #[test]
    fn config_without_auth() {
        let bytes = pack(&Conf {
            host: "smtp.example.com",
            auth: None,
        });
        let config = decode_config(&bytes).unwrap();
        assert!(config.auth.is_none());
    }

    #[test]
    fn config_missing_host_is_a_decode_error() {
        #[derive(Serialize)]
        struct Empty {}
        assert!(decode_config(&pack(&Empty {})).is_err());
    }

    #[test]
    fn config_with_non_string_host_is_a_decode_error() {
        #[derive(Serialize)]
        struct BadConf {
            host: u32,
        }
        assert!(decode_config(&pack(&BadConf { host: 25 })).is_err());
    }

    #[derive(Serialize, Default)]
    struct Req {
        to: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mail: Option<ReqMail>,
    }

    #[derive(Serialize, Default)]
    struct ReqMail {
        #[serde(skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        plain: Option<String>,
    }

    #[test]
    fn omitted_subject_stays_distinct_from_empty() {
        let omitted = pack(&Req {
            to: vec!["a@x.com".into()],
            mail: Some(ReqMail::default()),
        });
        let request = decode_request(&omitted).unwrap();
        assert_eq!(request.mail.unwrap().subject, None);

        let empty = pack(&Req {
            to: vec!["a@x.com".into()],
            mail: Some(ReqMail {
                subject: Some(String::new()),
                ..ReqMail::default()
            }),
        });
        let request = decode_request(&empty).unwrap();
        assert_eq!(request.mail.unwrap().subject, Some(String::new()));
    }

    #[test]
    fn omitted_mail_object_decodes_to_none() {
        let bytes = pack(&Req {
            to: vec!["a@x.com".into()],
            mail: None,
        });
        let request = decode_request(&bytes).unwrap();
        assert!(request.mail.is_none());
    }

    #[test]
    fn request_missing_to_is_a_decode_error() {
        #[derive(Serialize)]
        struct NoTo {
            mail: ReqMail,
        }
        assert!(decode_request(&pack(&NoTo { mail: ReqMail::default() })).is_err());
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        assert!(decode_request(&[0xc1, 0xff, 0x00]).is_err());
    }
}
