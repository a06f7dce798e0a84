use std::fmt;
use std::path::Path;

use log::{debug, error, info, warn};

use pvs_loader_error::{LoaderError, Result, bulk_err};

use crate::plan::SnapshotPlan;
use crate::sql::{table, view};
use crate::store::{CopyOutcome, SnapshotStore};

/// 적재 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    DropView,
    DeleteTable,
    CreateTable,
    BulkCopy,
    CreateView,
}

impl Step {
    /// 단계 이름 반환
    pub const fn name(self) -> &'static str {
        match self {
            Step::DropView => "drop view",
            Step::DeleteTable => "delete table",
            Step::CreateTable => "create table",
            Step::BulkCopy => "bulk copy",
            Step::CreateView => "create view",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 단계 실행 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Failed(String),
}

/// 실행 결과 요약
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub table: String,
    pub view: String,
    pub steps: Vec<(Step, StepOutcome)>,
    pub rows_loaded: Option<u64>,
}

impl RunReport {
    fn new(plan: &SnapshotPlan) -> Self {
        Self {
            table: plan.table.clone(),
            view: plan.view.clone(),
            steps: Vec::with_capacity(5),
            rows_loaded: None,
        }
    }

    fn record(&mut self, step: Step, result: &Result<()>) {
        let outcome = match result {
            Ok(()) => StepOutcome::Done,
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        self.steps.push((step, outcome));
    }

    /// 실패한 단계 목록
    pub fn failed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|(_, outcome)| matches!(outcome, StepOutcome::Failed(_)))
            .map(|(step, _)| *step)
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_steps().is_empty()
    }
}

/// 일일 스냅샷 적재기
///
/// 뷰 삭제, 테이블 삭제, 테이블 생성, COPY, 뷰 생성 순서로만 실행한다.
/// COPY 실패시 새 테이블을 삭제하고 뷰는 다시 만들지 않는다.
pub struct SnapshotLoader<S> {
    store: S,
    plan: SnapshotPlan,
    strict: bool,
}

impl<S: SnapshotStore> SnapshotLoader<S> {
    pub fn new(store: S, plan: SnapshotPlan) -> Self {
        Self {
            store,
            plan,
            strict: false,
        }
    }

    /// DDL 실패시 즉시 중단
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// 전체 적재 실행
    pub async fn run(&self, csv: &Path) -> Result<RunReport> {
        let mut report = RunReport::new(&self.plan);
        info!(
            "스냅샷 적재 시작: {} -> {} (뷰 {})",
            csv.display(),
            self.plan.table,
            self.plan.view
        );

        let result = self.drop_view().await;
        self.settle(&mut report, Step::DropView, result)?;

        let result = self.delete_table().await;
        self.settle(&mut report, Step::DeleteTable, result)?;

        let result = self.create_table().await;
        self.settle(&mut report, Step::CreateTable, result)?;

        match self.bulk_copy(csv).await {
            Ok(outcome) => {
                info!("{} 완료: {} 행 적재", Step::BulkCopy, outcome.rows);
                report.rows_loaded = Some(outcome.rows);
                report.record(Step::BulkCopy, &Ok(()));
            }
            Err(e) => {
                error!("{} 실패: {}", Step::BulkCopy, e);
                self.discard_table().await;
                return Err(e);
            }
        }

        let result = self.create_view().await;
        self.settle(&mut report, Step::CreateView, result)?;

        Self::log_summary(&report);
        Ok(report)
    }

    /// 단계 결과 기록, strict 모드에서만 에러 전파
    fn settle(&self, report: &mut RunReport, step: Step, result: Result<()>) -> Result<()> {
        report.record(step, &result);
        match result {
            Ok(()) => {
                info!("{step} 완료");
                Ok(())
            }
            Err(e) if self.strict || !e.is_recoverable() => {
                error!("{step} 실패, 적재 중단: {e}");
                Err(e)
            }
            Err(e) => {
                error!("{step} 실패, 다음 단계 진행: {e}");
                Ok(())
            }
        }
    }

    /// 리포팅 뷰 삭제
    pub async fn drop_view(&self) -> Result<()> {
        debug!("{} 실행", Step::DropView);
        self.store.execute(&view::drop_view(&self.plan.view)).await
    }

    /// 같은 날짜의 스냅샷 테이블 삭제
    pub async fn delete_table(&self) -> Result<()> {
        debug!("{} 실행", Step::DeleteTable);
        self.store.execute(&table::drop_table(&self.plan.table)).await
    }

    /// 기준 테이블 스키마로 빈 테이블 생성
    pub async fn create_table(&self) -> Result<()> {
        debug!("{} 실행", Step::CreateTable);
        self.store
            .execute(&table::create_table_like(
                &self.plan.base_table,
                &self.plan.table,
            ))
            .await
    }

    /// CSV 적재, 일부만 적재된 경우도 실패로 본다
    pub async fn bulk_copy(&self, csv: &Path) -> Result<CopyOutcome> {
        debug!("{} 실행", Step::BulkCopy);
        let statement = table::copy_from_stdin(&self.plan.table, self.plan.delimiter);

        let outcome = match self.store.copy_csv(&statement, csv).await {
            Ok(outcome) => outcome,
            Err(e @ LoaderError::BulkLoad(_)) => return Err(e),
            Err(e) => return Err(bulk_err(e)),
        };

        if !outcome.is_complete() {
            return Err(bulk_err(format!(
                "부분 적재: {} 줄 중 {} 행만 적재됨",
                outcome.lines, outcome.rows
            )));
        }
        Ok(outcome)
    }

    /// 리포팅 뷰 생성
    pub async fn create_view(&self) -> Result<()> {
        debug!("{} 실행", Step::CreateView);
        self.store
            .execute(&view::create_view(&self.plan.view, &self.plan.table))
            .await
    }

    /// COPY 실패 후 새 테이블 정리
    async fn discard_table(&self) {
        match self.delete_table().await {
            Ok(()) => info!("적재 실패한 테이블 삭제: {}", self.plan.table),
            Err(e) => warn!("적재 실패한 테이블 삭제 실패: {} ({e})", self.plan.table),
        }
    }

    fn log_summary(report: &RunReport) {
        let failed = report.failed_steps();
        if failed.is_empty() {
            info!(
                "스냅샷 적재 완료: {} ({} 행), 뷰 {}",
                report.table,
                report.rows_loaded.unwrap_or(0),
                report.view
            );
        } else {
            let names: Vec<&str> = failed.iter().map(|s| s.name()).collect();
            warn!(
                "스냅샷 적재 종료, 실패한 단계: {} (테이블 {})",
                names.join(", "),
                report.table
            );
        }
    }
}
