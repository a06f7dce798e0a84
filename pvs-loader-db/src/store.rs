use std::path::Path;

use async_trait::async_trait;
use log::debug;

use pvs_loader_config::ConfigSource;
use pvs_loader_error::{LoaderError, Result};

use crate::connection::connect;
use crate::copy::stream_file;

/// COPY 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyOutcome {
    /// 파일에서 전송한 줄 수
    pub lines: u64,
    /// 서버가 보고한 적재 행 수
    pub rows: u64,
}

impl CopyOutcome {
    /// 전송한 줄이 모두 적재되었는지 여부
    pub fn is_complete(&self) -> bool {
        self.lines == self.rows
    }
}

/// 스냅샷 적재에 필요한 db 작업
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// 파라미터 없는 SQL 실행
    async fn execute(&self, sql: &str) -> Result<()>;

    /// CSV 파일을 COPY 문으로 적재
    async fn copy_csv(&self, statement: &str, csv: &Path) -> Result<CopyOutcome>;
}

/// PostgreSQL 저장소, 작업마다 새 연결을 열고 닫는다
#[derive(Debug, Clone)]
pub struct PgStore {
    source: ConfigSource,
}

impl PgStore {
    pub fn new(source: ConfigSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl SnapshotStore for PgStore {
    async fn execute(&self, sql: &str) -> Result<()> {
        let session = connect(&self.source).await?;

        debug!("SQL 실행: {sql}");
        let result = session.client().batch_execute(sql).await.map_err(LoaderError::from);

        session.close().await;
        result
    }

    async fn copy_csv(&self, statement: &str, csv: &Path) -> Result<CopyOutcome> {
        let session = connect(&self.source).await?;

        debug!("COPY 시작: {statement} < {}", csv.display());
        let result = stream_file(session.client(), statement, csv).await;

        session.close().await;
        result
    }
}
