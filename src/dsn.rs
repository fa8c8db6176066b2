//! Data Source Name handling for the MySQL driver DSN format:
//! `[user[:password]@][net[(addr)]]/dbname[?param1=value1&paramN=valueN]`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Replacement shown instead of the password when a DSN is displayed or logged.
pub const DSN_PASSWORD_MASK: &str = "********";

const DEFAULT_PORT: &str = "3306";

static RE_DSN_PASSWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*):[^/]*?(@.*)$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid DSN: {reason}")]
pub struct DsnError {
    reason: String,
}

impl DsnError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Parsed MySQL Data Source Name.
///
/// `Debug` output masks the password.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Dsn {
    pub user: String,
    pub password: String,
    /// Network type, `tcp` or `unix`.
    pub net: String,
    /// `host:port` for `tcp`, socket path for `unix`.
    pub addr: String,
    pub db_name: String,
    /// Connection parameters, formatted in key order.
    pub params: BTreeMap<String, String>,
}

impl Dsn {
    /// Parse `dsn`; same as `dsn.parse::<Dsn>()`.
    ///
    /// # Errors
    ///
    /// Returns `DsnError` when `dsn` is not a valid MySQL DSN.
    pub fn parse(dsn: &str) -> Result<Self, DsnError> {
        dsn.parse()
    }

    /// Host and port when the network is `tcp`.
    #[must_use]
    pub fn tcp_host_port(&self) -> Option<(&str, u16)> {
        if self.net != "tcp" {
            return None;
        }
        let (host, port) = self.addr.rsplit_once(':')?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        Some((host, port.parse().ok()?))
    }

    fn normalize(&mut self) -> Result<(), DsnError> {
        if self.net.is_empty() {
            self.net = "tcp".to_string();
        }

        if self.addr.is_empty() {
            self.addr = match self.net.as_str() {
                "tcp" => format!("127.0.0.1:{DEFAULT_PORT}"),
                "unix" => "/tmp/mysql.sock".to_string(),
                other => {
                    return Err(DsnError::new(format!(
                        "default addr for network '{other}' unknown"
                    )));
                }
            };
        } else if self.net == "tcp" && !has_port(&self.addr) {
            self.addr = if self.addr.contains(':') {
                format!("[{}]:{DEFAULT_PORT}", self.addr)
            } else {
                format!("{}:{DEFAULT_PORT}", self.addr)
            };
        }

        Ok(())
    }
}

fn has_port(addr: &str) -> bool {
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.contains("]:");
    }
    addr.matches(':').count() == 1
}

impl FromStr for Dsn {
    type Err = DsnError;

    fn from_str(dsn: &str) -> Result<Self, Self::Err> {
        let mut cfg = Dsn::default();

        let Some(slash) = dsn.rfind('/') else {
            if dsn.is_empty() {
                cfg.normalize()?;
                return Ok(cfg);
            }
            return Err(DsnError::new("missing the slash separating the database name"));
        };

        let address = &dsn[..slash];
        if !address.is_empty() {
            let net_addr = match address.rfind('@') {
                Some(at) => {
                    let user_info = &address[..at];
                    match user_info.split_once(':') {
                        Some((user, password)) => {
                            cfg.user = user.to_string();
                            cfg.password = password.to_string();
                        }
                        None => cfg.user = user_info.to_string(),
                    }
                    &address[at + 1..]
                }
                None => address,
            };

            if let Some(open) = net_addr.find('(') {
                if !net_addr.ends_with(')') {
                    if net_addr[open..].contains(')') {
                        return Err(DsnError::new("did you forget to escape a param value?"));
                    }
                    return Err(DsnError::new(
                        "network address not terminated (missing closing brace)",
                    ));
                }
                cfg.net = net_addr[..open].to_string();
                cfg.addr = net_addr[open + 1..net_addr.len() - 1].to_string();
            } else {
                cfg.net = net_addr.to_string();
            }
        }

        let rest = &dsn[slash + 1..];
        let (db_name, params) = rest.split_once('?').unwrap_or((rest, ""));
        cfg.db_name = db_name.to_string();
        for param in params.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = param
                .split_once('=')
                .ok_or_else(|| DsnError::new(format!("invalid parameter '{param}'")))?;
            cfg.params.insert(key.to_string(), value.to_string());
        }

        cfg.normalize()?;
        Ok(cfg)
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dsn")
            .field("user", &self.user)
            .field("password", &DSN_PASSWORD_MASK)
            .field("net", &self.net)
            .field("addr", &self.addr)
            .field("db_name", &self.db_name)
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.user.is_empty() {
            f.write_str(&self.user)?;
            if !self.password.is_empty() {
                write!(f, ":{}", self.password)?;
            }
            f.write_str("@")?;
        }

        if !self.net.is_empty() {
            f.write_str(&self.net)?;
            if !self.addr.is_empty() {
                write!(f, "({})", self.addr)?;
            }
        }

        write!(f, "/{}", self.db_name)?;

        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// Replace the database name in `dsn`, returning the new DSN.
///
/// ```rust
/// use mysql_middleware::prelude::*;
///
/// let dsn = replace_dsn_database("u:pwd@tcp(127.0.0.1:3306)/bar", "foo")?;
/// assert_eq!(dsn, "u:pwd@tcp(127.0.0.1:3306)/foo");
/// # Ok::<(), DsnError>(())
/// ```
///
/// # Errors
///
/// Returns `DsnError` when `dsn` cannot be parsed.
pub fn replace_dsn_database(dsn: &str, name: &str) -> Result<String, DsnError> {
    let mut cfg = Dsn::parse(dsn)?;
    cfg.db_name = name.to_string();
    Ok(cfg.to_string())
}

/// Merge `params` into the parameters of `dsn`.
///
/// `parseTime=true` is added unless it is already present or supplied.
///
/// # Errors
///
/// Returns `DsnError` when `dsn` cannot be parsed.
pub fn set_dsn_params<I, K, V>(dsn: &str, params: I) -> Result<String, DsnError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut cfg = Dsn::parse(dsn)?;
    cfg.params
        .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
    cfg.params
        .entry("parseTime".to_string())
        .or_insert_with(|| "true".to_string());
    Ok(cfg.to_string())
}

/// Mask the password within `dsn` so it can be displayed or logged.
///
/// The mask is added even when the DSN has no password. A DSN that parses is rewritten in its
/// normalized form. Anything without user information is replaced by the mask as a whole.
#[must_use]
pub fn mask_password_in_dsn(dsn: &str) -> String {
    if let Ok(mut cfg) = Dsn::parse(dsn) {
        if cfg.user.is_empty() {
            return DSN_PASSWORD_MASK.to_string();
        }
        cfg.password = DSN_PASSWORD_MASK.to_string();
        return cfg.to_string();
    }

    let masked = RE_DSN_PASSWORD.replace(dsn, format!("${{1}}:{DSN_PASSWORD_MASK}${{2}}"));
    if masked == dsn {
        DSN_PASSWORD_MASK.to_string()
    } else {
        masked.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_DSN: &str = "u:pwd@tcp(127.0.0.1:3306)/";

    #[test]
    fn replaces_missing_database() {
        let dsn = replace_dsn_database(BASE_DSN, "foo").unwrap();
        assert_eq!(dsn, format!("{BASE_DSN}foo"));
    }

    #[test]
    fn replaces_existing_database() {
        let dsn = replace_dsn_database(&format!("{BASE_DSN}bar?parseTime=true"), "foo").unwrap();
        assert_eq!(dsn, format!("{BASE_DSN}foo?parseTime=true"));
    }

    #[test]
    fn replace_rejects_non_dsn() {
        let err = replace_dsn_database("foobar", "foo").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid DSN: missing the slash separating the database name"
        );
    }

    #[test]
    fn sets_params_with_parse_time_default() {
        let dsn = set_dsn_params(BASE_DSN, [("fooBar", "1234")]).unwrap();
        assert_eq!(dsn, "u:pwd@tcp(127.0.0.1:3306)/?fooBar=1234&parseTime=true");
    }

    #[test]
    fn keeps_explicit_parse_time() {
        let dsn = set_dsn_params(&format!("{BASE_DSN}db?parseTime=false"), [("a", "1")]).unwrap();
        assert_eq!(dsn, "u:pwd@tcp(127.0.0.1:3306)/db?a=1&parseTime=false");

        let dsn = set_dsn_params(BASE_DSN, [("parseTime", "false")]).unwrap();
        assert_eq!(dsn, "u:pwd@tcp(127.0.0.1:3306)/?parseTime=false");
    }

    #[test]
    fn parses_all_parts() {
        let cfg = Dsn::parse("root:s3:cret@tcp(db.local:13399)/shop?charset=utf8mb4").unwrap();
        assert_eq!(cfg.user, "root");
        assert_eq!(cfg.password, "s3:cret");
        assert_eq!(cfg.net, "tcp");
        assert_eq!(cfg.addr, "db.local:13399");
        assert_eq!(cfg.db_name, "shop");
        assert_eq!(cfg.params.get("charset").map(String::as_str), Some("utf8mb4"));
        assert_eq!(cfg.tcp_host_port(), Some(("db.local", 13399)));
    }

    #[test]
    fn fills_in_defaults() {
        assert_eq!(Dsn::parse("u@/db").unwrap().to_string(), "u@tcp(127.0.0.1:3306)/db");
        assert_eq!(Dsn::parse("").unwrap().to_string(), "tcp(127.0.0.1:3306)/");
        assert_eq!(
            Dsn::parse("u:p@tcp(localhost)/").unwrap().to_string(),
            "u:p@tcp(localhost:3306)/"
        );
        assert_eq!(
            Dsn::parse("u:p@tcp(::1)/").unwrap().addr,
            "[::1]:3306"
        );
        assert_eq!(
            Dsn::parse("u@unix/db").unwrap().to_string(),
            "u@unix(/tmp/mysql.sock)/db"
        );
        assert_eq!(
            Dsn::parse("u@unix(/var/run/mysqld.sock)/db").unwrap().addr,
            "/var/run/mysqld.sock"
        );
    }

    #[test]
    fn rejects_malformed_dsn() {
        assert!(Dsn::parse("u:p@tcp(127.0.0.1:3306/db").is_err());
        assert!(Dsn::parse("u:p@tcp(127.0.0.1:3306)/db?novalue").is_err());
        assert!(Dsn::parse("u:p@pipe/db").is_err());
    }

    #[test]
    fn masks_password() {
        assert_eq!(
            mask_password_in_dsn(BASE_DSN),
            BASE_DSN.replacen(":pwd", &format!(":{DSN_PASSWORD_MASK}"), 1)
        );
    }

    #[test]
    fn masks_empty_password() {
        let have = BASE_DSN.replacen(":pwd", ":", 1);
        let exp = have.replacen(":@", &format!(":{DSN_PASSWORD_MASK}@"), 1);
        assert_eq!(mask_password_in_dsn(&have), exp);
    }

    #[test]
    fn masks_missing_password() {
        assert_eq!(
            mask_password_in_dsn("u@tcp(127.0.0.1:3306)/"),
            "u:********@tcp(127.0.0.1:3306)/"
        );
    }

    #[test]
    fn masks_passwords_with_separator_chars() {
        assert_eq!(
            mask_password_in_dsn("app:se/cret@tcp(db:3306)/shop"),
            "app:********@tcp(db:3306)/shop"
        );
        assert_eq!(
            mask_password_in_dsn("app:p@ss@tcp(db:3306)/shop"),
            "app:********@tcp(db:3306)/shop"
        );
    }

    #[test]
    fn masks_unparsable_dsn_without_leaking() {
        // unterminated address; the password never reaches the output
        assert_eq!(
            mask_password_in_dsn("app:secret@tcp(db:3306/shop"),
            "app:********@tcp(db:3306/shop"
        );
        assert_eq!(mask_password_in_dsn("app:se/cret@tcp(db"), DSN_PASSWORD_MASK);
    }

    #[test]
    fn debug_hides_password() {
        let cfg = Dsn::parse(BASE_DSN).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("pwd"));
        assert!(debug.contains(DSN_PASSWORD_MASK));
    }

    #[test]
    fn masks_everything_when_not_a_dsn() {
        assert_eq!(mask_password_in_dsn("foobar"), DSN_PASSWORD_MASK);
        assert_eq!(mask_password_in_dsn(""), DSN_PASSWORD_MASK);
    }
}
