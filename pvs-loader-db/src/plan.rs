use chrono::NaiveDate;

use pvs_loader_config::SnapshotConfig;
use pvs_loader_error::{Result, config_err};

/// PostgreSQL 식별자 최대 길이(바이트)
const MAX_IDENTIFIER_LEN: usize = 63;

/// 텍스트 COPY 에서 구분자로 쓸 수 없는 문자
const FORBIDDEN_DELIMITERS: &str = "\\.abcdefghijklmnopqrstuvwxyz0123456789'\"";

/// 하루치 스냅샷 실행 계획
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPlan {
    pub base_table: String,
    pub table: String,
    pub view: String,
    pub delimiter: char,
}

impl SnapshotPlan {
    /// 설정과 날짜로 실행 계획 생성
    pub fn new(config: &SnapshotConfig, date: NaiveDate) -> Result<Self> {
        let table = Self::table_name(&config.table_prefix, date);

        validate_identifier(&config.base_table)?;
        validate_identifier(&table)?;
        validate_identifier(&config.view_name)?;
        validate_delimiter(config.delimiter)?;

        Ok(Self {
            base_table: config.base_table.clone(),
            table,
            view: config.view_name.clone(),
            delimiter: config.delimiter,
        })
    }

    /// `<prefix><YYYYMMDD>` 형식의 테이블 이름
    pub fn table_name(prefix: &str, date: NaiveDate) -> String {
        format!("{}{}", prefix, date.format("%Y%m%d"))
    }
}

/// 따옴표 없이 쓸 수 있는 식별자인지 검증
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_head || !valid_tail {
        return Err(config_err(format!("잘못된 식별자: '{name}'")));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(config_err(format!(
            "식별자 길이 초과 ({} > {MAX_IDENTIFIER_LEN}): '{name}'",
            name.len()
        )));
    }
    Ok(())
}

/// COPY 구분자 검증
pub fn validate_delimiter(delimiter: char) -> Result<()> {
    if !delimiter.is_ascii()
        || (delimiter.is_ascii_control() && delimiter != '\t')
        || FORBIDDEN_DELIMITERS.contains(delimiter.to_ascii_lowercase())
    {
        return Err(config_err(format!(
            "사용할 수 없는 구분자: {delimiter:?}"
        )));
    }
    Ok(())
}
