use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use ini::{Ini, Properties};
use log::warn;

use pvs_loader_error::{LoaderError, Result, config_err};

/// db 연결설정
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub sslmode: String,
    pub connect_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: None,
            user: None,
            password: None,
            sslmode: "prefer".to_string(),
            connect_timeout: None,
        }
    }
}

// 비밀번호는 로그에 남기지 않음
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("sslmode", &self.sslmode)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ConnectionConfig {
    /// 설정파일의 섹션에서 연결설정 로드
    pub fn from_file<P: AsRef<Path>>(path: P, section: &str) -> Result<Self> {
        let path = path.as_ref();
        // 파일이 없으면 섹션이 없는 것과 같이 처리
        let ini = match Ini::load_from_file(path) {
            Ok(ini) => ini,
            Err(ini::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(missing_section(section, path));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_ini(&ini, section, path)
    }

    /// 파싱된 INI 에서 연결설정 로드
    pub fn from_ini(ini: &Ini, section: &str, path: &Path) -> Result<Self> {
        match ini.section(Some(section)) {
            Some(props) => Self::from_properties(props),
            None => Err(missing_section(section, path)),
        }
    }

    fn from_properties(props: &Properties) -> Result<Self> {
        let mut config = Self::default();

        for (key, value) in props.iter() {
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "host" => config.host = value.to_string(),
                "port" => {
                    config.port = value
                        .parse()
                        .map_err(|e| config_err(format!("잘못된 port 값 '{value}': {e}")))?;
                }
                "database" | "dbname" => config.dbname = Some(value.to_string()),
                "user" => config.user = Some(value.to_string()),
                "password" => config.password = Some(value.to_string()),
                "sslmode" => config.sslmode = parse_sslmode(value)?,
                "connect_timeout" => {
                    let secs: u64 = value.parse().map_err(|e| {
                        config_err(format!("잘못된 connect_timeout 값 '{value}': {e}"))
                    })?;
                    config.connect_timeout = Some(Duration::from_secs(secs));
                }
                other => warn!("알 수 없는 연결설정 키 무시: {other}"),
            }
        }

        Ok(config)
    }
}

/// TLS 없이 연결하므로 TLS 를 강제하는 모드는 거부
fn parse_sslmode(value: &str) -> Result<String> {
    let mode = value.to_lowercase();
    match mode.as_str() {
        "disable" | "allow" | "prefer" => Ok(mode),
        "require" | "verify-ca" | "verify-full" => Err(config_err(format!(
            "sslmode={mode} 은 지원하지 않음 (TLS 미지원, disable/allow/prefer 사용)"
        ))),
        _ => Err(config_err(format!("알 수 없는 sslmode 값: '{value}'"))),
    }
}

fn missing_section(section: &str, path: &Path) -> LoaderError {
    config_err(format!(
        "Section {} not found in the {} file",
        section,
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str, section: &str) -> Result<ConnectionConfig> {
        let ini = Ini::load_from_str(text).unwrap();
        ConnectionConfig::from_ini(&ini, section, Path::new("postgres.ini"))
    }

    #[test]
    fn test_reads_postgresql_section() {
        let config = parse(
            "[postgresql]\nhost=db.internal\nport=6543\ndatabase=pvsdata\nuser=loader\npassword=secret\n",
            "postgresql",
        )
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.dbname.as_deref(), Some("pvsdata"));
        assert_eq!(config.user.as_deref(), Some("loader"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.sslmode, "prefer");
    }

    #[test]
    fn test_dbname_alias_and_timeout() {
        let config = parse(
            "[postgresql]\ndbname=pvsdata\nconnect_timeout=15\nsslmode=DISABLE\n",
            "postgresql",
        )
        .unwrap();

        assert_eq!(config.dbname.as_deref(), Some("pvsdata"));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.sslmode, "disable");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
    }

    #[test]
    fn test_missing_section_fails() {
        let err = parse("[other]\nhost=x\n", "postgresql").unwrap_err();
        assert!(
            err.to_string()
                .contains("Section postgresql not found in the postgres.ini file")
        );
    }

    #[test]
    fn test_tls_only_sslmode_rejected() {
        for mode in ["require", "verify-ca", "verify-full", "bogus"] {
            let text = format!("[postgresql]\nsslmode={mode}\n");
            let err = parse(&text, "postgresql").unwrap_err();
            assert!(matches!(err, LoaderError::Config(_)), "{mode}");
        }
        let config = parse("[postgresql]\nsslmode=allow\n", "postgresql").unwrap();
        assert_eq!(config.sslmode, "allow");
    }

    #[test]
    fn test_invalid_port_fails() {
        let err = parse("[postgresql]\nport=abc\n", "postgresql").unwrap_err();
        assert!(matches!(err, LoaderError::Config(_)));
    }

    #[test]
    fn test_missing_file_reports_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postgres.ini");
        let err = ConnectionConfig::from_file(&path, "postgresql").unwrap_err();
        assert!(err.to_string().contains("Section postgresql not found"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[postgresql]\nhost=10.0.0.5\nuser=pvs").unwrap();

        let config = ConnectionConfig::from_file(file.path(), "postgresql").unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.user.as_deref(), Some("pvs"));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ConnectionConfig {
            password: Some("hunter2".to_string()),
            ..ConnectionConfig::default()
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
