/// 뷰 삭제 쿼리
pub fn drop_view(view: &str) -> String {
    format!("DROP VIEW IF EXISTS {view};")
}

/// 스냅샷 테이블 전체를 조회하는 뷰 생성 쿼리
pub fn create_view(view: &str, source_table: &str) -> String {
    format!("CREATE VIEW {view} AS (SELECT * FROM {source_table});")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_queries() {
        assert_eq!(
            drop_view("pvsdata_all_services"),
            "DROP VIEW IF EXISTS pvsdata_all_services;"
        );
        assert_eq!(
            create_view("pvsdata_all_services", "all_powervs_services_20261017"),
            "CREATE VIEW pvsdata_all_services AS (SELECT * FROM all_powervs_services_20261017);"
        );
    }
}
