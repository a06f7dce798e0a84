use std::io;
use std::path::Path;

use ini::Ini;
use log::{info, warn};

use pvs_loader_error::{Result, config_err};

/// 스냅샷 설정 섹션 이름
pub const SNAPSHOT_SECTION: &str = "snapshot";

/// 스냅샷 테이블/뷰 이름 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// 스키마를 복사할 기준 테이블
    pub base_table: String,
    /// 날짜가 붙는 스냅샷 테이블 접두사
    pub table_prefix: String,
    /// 최신 스냅샷을 가리키는 리포팅 뷰
    pub view_name: String,
    /// CSV 구분자
    pub delimiter: char,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotConfig {
    /// 기본설정으로 생성
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_table: "powervs_services_base_table".to_string(),
            table_prefix: "all_powervs_services_".to_string(),
            view_name: "pvsdata_all_services".to_string(),
            delimiter: ',',
        }
    }

    /// 설정파일에서 스냅샷 설정 로드, 파일이나 섹션이 없으면 기본값
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Ini::load_from_file(path) {
            Ok(ini) => Self::from_ini(&ini),
            Err(ini::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!("설정파일 없음, 스냅샷 기본설정 사용: {}", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 파싱된 INI 에서 스냅샷 설정 로드
    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let mut config = Self::new();

        let Some(props) = ini.section(Some(SNAPSHOT_SECTION)) else {
            info!("스냅샷 기본설정 사용");
            return Ok(config);
        };

        for (key, value) in props.iter() {
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "base_table" => config.base_table = value.to_string(),
                "table_prefix" => config.table_prefix = value.to_string(),
                "view_name" => config.view_name = value.to_string(),
                "delimiter" => {
                    let mut chars = value.chars();
                    config.delimiter = match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => {
                            return Err(config_err(format!(
                                "delimiter 는 한 글자여야 함: '{value}'"
                            )));
                        }
                    };
                }
                other => warn!("알 수 없는 스냅샷 설정 키 무시: {other}"),
            }
        }

        Ok(config)
    }
}
