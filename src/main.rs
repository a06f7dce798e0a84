use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::Parser;
use clap::error::ErrorKind;
use env_logger::{Builder, Target};
use log::{LevelFilter, error, info};

use pvs_loader_config::Settings;
use pvs_loader_db::{PgStore, RunReport, SnapshotLoader, SnapshotPlan, locate_csv};
use pvs_loader_error::{LoaderError, Result};

/// PowerVS 서비스 CSV 를 날짜별 스냅샷 테이블로 적재하고 리포팅 뷰를 갱신
#[derive(Parser, Debug)]
#[command(name = "pvs-loader", version, about, long_about = None)]
struct Cli {
    /// 모든 VM 정보가 담긴 CSV 파일
    csv_file: PathBuf,

    /// INI 설정파일 (기본: $PVS_LOADER_CONFIG 또는 postgres.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 연결설정 섹션 (기본: postgresql)
    #[arg(long)]
    section: Option<String>,

    /// 스냅샷 날짜 YYYYMMDD (기본: 오늘)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// DDL 단계 실패시 즉시 중단
    #[arg(long)]
    strict: bool,
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|e| format!("YYYYMMDD 형식이 아님 '{value}': {e}"))
}

/// 로거 세팅, 단계별 에러를 표준출력으로 남긴다
fn setup_logger() {
    #[cfg(debug_assertions)]
    {
        Builder::new()
            .filter(None, LevelFilter::Debug)
            .parse_default_env()
            .target(Target::Stdout)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} {} {}:{}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init()
    }

    #[cfg(not(debug_assertions))]
    {
        Builder::new()
            .filter(None, LevelFilter::Info)
            .parse_default_env()
            .target(Target::Stdout)
            .init();
    }
}

/// 인자 파싱, 인자 누락시 사용법 출력 후 종료코드 1
fn parse_cli() -> std::result::Result<Cli, ExitCode> {
    match Cli::try_parse() {
        Ok(cli) => Ok(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            Err(ExitCode::SUCCESS)
        }
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            println!("ERROR: the csv file with all VMs was not set as parameter.");
            println!("       pvs-loader all_services.csv");
            Err(ExitCode::from(1))
        }
        Err(e) => {
            let _ = e.print();
            Err(ExitCode::from(1))
        }
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    // db 접근 전에 CSV 확인
    let csv = locate_csv(&cli.csv_file).await?;

    let settings = Settings::new(cli.config.as_deref(), cli.section.as_deref())?;
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let plan = SnapshotPlan::new(&settings.snapshot, date)?;

    let loader = SnapshotLoader::new(PgStore::new(settings.source), plan).strict(cli.strict);
    loader.run(&csv).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    setup_logger();
    info!("pvs-loader 시작");

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(LoaderError::Usage(msg)) => {
            println!("ERROR: {msg}");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("스냅샷 적재 실패: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_positional_only() {
        let cli = Cli::try_parse_from(["pvs-loader", "all_services.csv"]).unwrap();
        assert_eq!(cli.csv_file, PathBuf::from("all_services.csv"));
        assert!(cli.config.is_none());
        assert!(cli.date.is_none());
        assert!(!cli.strict);
    }

    #[test]
    fn test_cli_missing_csv() {
        let err = Cli::try_parse_from(["pvs-loader"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::try_parse_from([
            "pvs-loader",
            "--config",
            "/etc/pvs/postgres.ini",
            "--section",
            "reporting",
            "--date",
            "20261001",
            "--strict",
            "vms.csv",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/pvs/postgres.ini")));
        assert_eq!(cli.section.as_deref(), Some("reporting"));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2026, 10, 1));
        assert!(cli.strict);
    }

    #[test]
    fn test_cli_bad_date() {
        assert!(Cli::try_parse_from(["pvs-loader", "--date", "2026-10-01", "vms.csv"]).is_err());
    }

    #[tokio::test]
    async fn test_missing_csv_never_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "pvs-loader",
            "--config",
            dir.path().join("does-not-exist.ini").to_str().unwrap(),
            dir.path().join("missing.csv").to_str().unwrap(),
        ])
        .unwrap();

        let err = run(cli).await.unwrap_err();
        assert!(matches!(err, LoaderError::Usage(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
