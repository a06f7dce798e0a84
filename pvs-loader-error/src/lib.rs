use std::error::Error as StdError;
use std::fmt;
use std::io;

use ini::Error as IniError;
use tokio_postgres::Error as PgError;

/// 스냅샷 로더의 모든 에러 타입을 정의합니다.
#[derive(Debug)]
pub enum LoaderError {
    /// CLI 인자 에러
    Usage(String),

    /// 설정 관련 에러
    Config(String),

    /// 데이터베이스 연결 에러
    Connection(String),

    /// SQL 실행 에러
    Database(String),

    /// 벌크 로드(COPY) 에러
    BulkLoad(String),

    /// 파일 입출력 에러
    Io(io::Error),
}

impl LoaderError {
    /// 프로세스 종료 코드
    pub const fn exit_code(&self) -> u8 {
        1
    }

    /// 이후 단계를 계속 진행해도 되는 에러인지 여부
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LoaderError::Config(_) | LoaderError::Connection(_) | LoaderError::Database(_)
        )
    }
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Usage(msg) => write!(f, "사용법 에러: {}", msg),
            LoaderError::Config(msg) => write!(f, "설정 에러: {}", msg),
            LoaderError::Connection(msg) => write!(f, "DB 연결 에러: {}", msg),
            LoaderError::Database(msg) => write!(f, "데이터베이스 에러: {}", msg),
            LoaderError::BulkLoad(msg) => write!(f, "벌크 로드 에러: {}", msg),
            LoaderError::Io(err) => write!(f, "I/O 에러: {}", err),
        }
    }
}

impl StdError for LoaderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            LoaderError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Result 타입 별칭 정의
pub type Result<T> = std::result::Result<T, LoaderError>;

impl From<io::Error> for LoaderError {
    fn from(err: io::Error) -> Self {
        LoaderError::Io(err)
    }
}

impl From<PgError> for LoaderError {
    fn from(err: PgError) -> Self {
        LoaderError::Database(format!("PostgreSQL 에러: {}", pg_message(&err)))
    }
}

/// 서버 에러면 SQLSTATE 와 메시지까지 포함
pub fn pg_message(err: &PgError) -> String {
    match err.as_db_error() {
        Some(db) => format!("{} ({}): {}", err, db.code().code(), db.message()),
        None => err.to_string(),
    }
}

impl From<IniError> for LoaderError {
    fn from(err: IniError) -> Self {
        LoaderError::Config(format!("INI 파싱 에러: {}", err))
    }
}

/// 에러 처리 유틸리티 함수
pub fn config_err<E: fmt::Display>(err: E) -> LoaderError {
    LoaderError::Config(format!("{}", err))
}

pub fn conn_err<E: fmt::Display>(err: E) -> LoaderError {
    LoaderError::Connection(format!("{}", err))
}

pub fn db_err<E: fmt::Display>(err: E) -> LoaderError {
    LoaderError::Database(format!("{}", err))
}

pub fn bulk_err<E: fmt::Display>(err: E) -> LoaderError {
    LoaderError::BulkLoad(format!("{}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_message() {
        let err = config_err("Section postgresql not found in the postgres.ini file");
        assert_eq!(
            err.to_string(),
            "설정 에러: Section postgresql not found in the postgres.ini file"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let err: LoaderError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(err.source().is_some());
        assert!(bulk_err("x").source().is_none());
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(config_err("a").is_recoverable());
        assert!(conn_err("a").is_recoverable());
        assert!(db_err("a").is_recoverable());
        assert!(!bulk_err("a").is_recoverable());
        assert!(!LoaderError::Usage("a".into()).is_recoverable());
    }

    #[test]
    fn test_every_error_exits_with_one() {
        assert_eq!(bulk_err("a").exit_code(), 1);
        assert_eq!(LoaderError::Usage("a".into()).exit_code(), 1);
    }
}
