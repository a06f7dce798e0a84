use std::path::{Path, PathBuf};

use log::info;
use once_cell::sync::Lazy;

use pvs_loader_error::{LoaderError, Result};

use crate::dbconfig::ConnectionConfig;
use crate::snapshot::SnapshotConfig;

/// 기본 설정파일
pub const DEFAULT_CONFIG_FILE: &str = "postgres.ini";

/// 기본 연결설정 섹션
pub const DEFAULT_SECTION: &str = "postgresql";

/// 설정파일 경로, 환경변수 우선
static CONFIG_FILE: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("PVS_LOADER_CONFIG")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
});

/// 연결설정 위치
///
/// 매 연결마다 파일을 다시 읽으므로 섹션이 없으면 각 단계가 개별적으로 실패한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub section: String,
}

impl ConfigSource {
    pub fn new(path: impl Into<PathBuf>, section: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            section: section.into(),
        }
    }

    /// 연결설정 로드
    pub fn load_connection(&self) -> Result<ConnectionConfig> {
        ConnectionConfig::from_file(&self.path, &self.section)
    }
}

/// 통합 세팅 인스턴스
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: ConfigSource,
    pub snapshot: SnapshotConfig,
}

impl Settings {
    /// Setting 생성
    pub fn new(path: Option<&Path>, section: Option<&str>) -> Result<Self> {
        let path = path.map_or_else(|| CONFIG_FILE.clone(), Path::to_path_buf);
        let section = section.unwrap_or(DEFAULT_SECTION);

        info!("설정파일: {} [{}]", path.display(), section);
        let snapshot = Self::load_snapshot_config(&path)?;

        Ok(Self {
            source: ConfigSource::new(path, section),
            snapshot,
        })
    }

    /// 스냅샷 설정 로드
    fn load_snapshot_config(path: &Path) -> Result<SnapshotConfig> {
        match SnapshotConfig::from_file(path) {
            Ok(config) => Ok(config),
            Err(e) => Err(LoaderError::Config(format!(
                "스냅샷 설정 로드 실패: {}",
                e
            ))),
        }
    }
}
