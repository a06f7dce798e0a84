use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::SinkExt;
use log::debug;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_postgres::{Client, CopyInSink};

use pvs_loader_error::{LoaderError, Result, bulk_err, pg_message};

use crate::store::CopyOutcome;

/// 한 번에 전송하는 청크 크기
pub const CHUNK_SIZE: usize = 64 * 1024;

/// 줄 시작의 `\.` 종료 표시 인식 상태
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum EndMarker {
    #[default]
    None,
    Backslash,
    Dot,
}

/// COPY 텍스트 포맷 기준 행 수 집계
///
/// 백슬래시로 이스케이프된 개행은 행 안의 데이터이고 `\.` 줄에서 데이터가 끝난다.
/// 청크 경계를 넘는 이스케이프/종료 표시 상태를 유지한다.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineCounter {
    lines: u64,
    open_line: bool,
    escaped: bool,
    marker: EndMarker,
    finished: bool,
}

impl LineCounter {
    pub fn feed(&mut self, chunk: &[u8]) {
        for &b in chunk {
            if self.finished {
                return;
            }
            self.step(b);
        }
    }

    fn step(&mut self, b: u8) {
        if self.escaped {
            self.escaped = false;
            self.open_line = true;
            self.marker = match (self.marker, b) {
                (EndMarker::Backslash, b'.') => EndMarker::Dot,
                _ => EndMarker::None,
            };
            return;
        }

        match b {
            b'\\' => {
                self.marker = if self.open_line {
                    EndMarker::None
                } else {
                    EndMarker::Backslash
                };
                self.escaped = true;
                self.open_line = true;
            }
            b'\n' if self.marker == EndMarker::Dot => {
                self.finished = true;
                self.open_line = false;
            }
            b'\n' => {
                self.lines += 1;
                self.open_line = false;
                self.marker = EndMarker::None;
            }
            // `\.\r\n` 도 종료 표시
            b'\r' if self.marker == EndMarker::Dot => {}
            _ => {
                self.open_line = true;
                self.marker = EndMarker::None;
            }
        }
    }

    /// 개행으로 끝나지 않은 마지막 행 포함, 종료 표시 줄은 제외
    pub fn total(&self) -> u64 {
        if self.finished || self.marker == EndMarker::Dot {
            self.lines
        } else {
            self.lines + u64::from(self.open_line)
        }
    }
}

/// CSV 파일 존재 확인
pub async fn locate_csv(path: &Path) -> Result<PathBuf> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(path.to_path_buf()),
        _ => Err(LoaderError::Usage(
            "could not locate the required .csv file".to_string(),
        )),
    }
}

/// 파일을 청크 단위로 COPY 스트림에 전송
pub async fn stream_file(client: &Client, statement: &str, path: &Path) -> Result<CopyOutcome> {
    let mut file = File::open(path).await?;

    let sink: CopyInSink<Bytes> = client
        .copy_in(statement)
        .await
        .map_err(|e| bulk_err(pg_message(&e)))?;
    futures::pin_mut!(sink);

    let mut counter = LineCounter::default();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        counter.feed(&buf[..n]);
        sink.send(Bytes::copy_from_slice(&buf[..n]))
            .await
            .map_err(|e| bulk_err(pg_message(&e)))?;
    }

    let rows = sink
        .as_mut()
        .finish()
        .await
        .map_err(|e| bulk_err(pg_message(&e)))?;
    debug!("COPY 완료: {} 줄 전송, {} 행 적재", counter.total(), rows);

    Ok(CopyOutcome {
        lines: counter.total(),
        rows,
    })
}
