use log::{debug, error};
use tokio::task::JoinHandle;
use tokio_postgres::{
    Client, NoTls,
    config::{Config, SslMode},
};

use pvs_loader_config::{ConfigSource, ConnectionConfig};
use pvs_loader_error::{Result, conn_err};

/// 작업 하나 동안만 유지되는 db 연결
pub struct Session {
    client: Client,
    handle: JoinHandle<()>,
}

impl Session {
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// 연결 종료, 백그라운드 연결 태스크가 끝날 때까지 대기
    pub async fn close(self) {
        drop(self.client);
        if let Err(e) = self.handle.await {
            error!("db 연결 태스크 종료 실패: {e}");
        }
        debug!("db 연결 종료");
    }
}

/// 설정을 다시 읽어 새 연결 생성
pub async fn connect(source: &ConfigSource) -> Result<Session> {
    let config = source.load_connection()?;
    let pg_config = create_pg_config(&config);

    debug!("db 연결 시도: {}:{}", config.host, config.port);
    let (client, connection) = pg_config
        .connect(NoTls)
        .await
        .map_err(|e| conn_err(format!("데이터베이스 연결 실패: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("db 연결 에러: {e}");
        }
    });

    Ok(Session { client, handle })
}

/// `PostgreSQL` 설정 생성
pub fn create_pg_config(config: &ConnectionConfig) -> Config {
    let ssl_mode = match config.sslmode.as_str() {
        "disable" => SslMode::Disable,
        _ => SslMode::Prefer,
    };

    let mut pg_config = Config::new();
    pg_config
        .host(config.host.as_str())
        .port(config.port)
        .ssl_mode(ssl_mode)
        .application_name("pvs-loader")
        .keepalives(true);

    if let Some(dbname) = &config.dbname {
        pg_config.dbname(dbname.as_str());
    }
    if let Some(user) = &config.user {
        pg_config.user(user.as_str());
    }
    if let Some(password) = &config.password {
        pg_config.password(password.as_str());
    }
    if let Some(timeout) = config.connect_timeout {
        pg_config.connect_timeout(timeout);
    }

    pg_config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_postgres::config::Host;

    #[test]
    fn test_pg_config_from_connection() {
        let config = ConnectionConfig {
            host: "db.internal".to_string(),
            port: 6543,
            dbname: Some("pvsdata".to_string()),
            user: Some("loader".to_string()),
            password: Some("secret".to_string()),
            sslmode: "disable".to_string(),
            connect_timeout: Some(Duration::from_secs(5)),
        };
        let pg_config = create_pg_config(&config);

        assert_eq!(pg_config.get_hosts(), &[Host::Tcp("db.internal".to_string())]);
        assert_eq!(pg_config.get_ports(), &[6543]);
        assert_eq!(pg_config.get_dbname(), Some("pvsdata"));
        assert_eq!(pg_config.get_user(), Some("loader"));
        assert_eq!(pg_config.get_password(), Some(&b"secret"[..]));
        assert_eq!(pg_config.get_ssl_mode(), SslMode::Disable);
        assert_eq!(pg_config.get_connect_timeout(), Some(&Duration::from_secs(5)));
    }

    #[test]
    fn test_unknown_sslmode_prefers() {
        let config = ConnectionConfig {
            sslmode: "allow".to_string(),
            ..ConnectionConfig::default()
        };
        let pg_config = create_pg_config(&config);
        assert_eq!(pg_config.get_ssl_mode(), SslMode::Prefer);
        assert_eq!(pg_config.get_dbname(), None);
    }

    #[tokio::test]
    async fn test_connect_without_section_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postgres.ini");
        std::fs::write(&path, "[other]\nhost=x\n").unwrap();

        let err = connect(&ConfigSource::new(&path, "postgresql"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, pvs_loader_error::LoaderError::Config(_)));
    }
}
