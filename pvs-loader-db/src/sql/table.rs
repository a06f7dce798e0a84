//! 스냅샷 테이블 쿼리
//!
//! 식별자는 `SnapshotPlan` 에서 검증된 값만 들어온다.

/// 테이블 삭제 쿼리
pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table};")
}

/// 기준 테이블 스키마만 복사하는 테이블 생성 쿼리
pub fn create_table_like(base_table: &str, table: &str) -> String {
    format!("CREATE TABLE {table} AS (SELECT * FROM {base_table}) WITH NO DATA;")
}

/// 텍스트 포맷 COPY 쿼리
pub fn copy_from_stdin(table: &str, delimiter: char) -> String {
    format!("COPY {table} FROM STDIN WITH (FORMAT text, DELIMITER '{delimiter}')")
}
