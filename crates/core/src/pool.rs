//! Translate many presentation files on a fixed number of worker threads.

use crate::translator::PresentationTranslator;
use crate::types::TranslationResult;
use crate::{Error, Result};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::thread;

/// One file to translate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub language: String,
}

impl BatchJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, language: &str) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            language: language.to_string(),
        }
    }
}

/// How one job ended.
#[derive(Debug)]
pub struct BatchOutcome {
    pub job: BatchJob,
    pub result: Result<TranslationResult>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(&self.result, Ok(result) if result.is_ok())
    }
}

/// Run `jobs` on up to `workers` threads and return one outcome per job, in job order.
///
/// Each worker builds its own translator through `factory`, so neither the
/// loader nor the service has to be shared between threads. A failing file
/// never stops the others.
pub fn translate_batch_files<F>(
    jobs: Vec<BatchJob>,
    workers: usize,
    factory: F,
) -> Vec<BatchOutcome>
where
    F: Fn() -> Result<PresentationTranslator> + Sync,
{
    let total = jobs.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, total);
    log::info!("Translating {} files with {} workers", total, workers);

    let queue = Mutex::new(jobs.into_iter().enumerate().collect::<VecDeque<_>>());
    let mut slots: Vec<Option<BatchOutcome>> = (0..total).map(|_| None).collect();
    let (tx, rx) = mpsc::channel::<(usize, BatchOutcome)>();

    thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let factory = &factory;
            scope.spawn(move || {
                let translator = factory();
                if let Err(e) = &translator {
                    log::error!("Worker {} could not start: {}", worker, e);
                }
                while let Some((index, job)) = next_job(queue) {
                    let result = match &translator {
                        Ok(translator) => translator.translate_presentation(
                            &job.input,
                            &job.output,
                            &job.language,
                        ),
                        Err(e) => Err(Error::ConfigError(format!("worker setup failed: {}", e))),
                    };
                    if tx.send((index, BatchOutcome { job, result })).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        for (done, (index, outcome)) in rx.iter().enumerate() {
            match &outcome.result {
                Ok(result) => log::info!(
                    "[{}/{}] {}: {} texts translated",
                    done + 1,
                    total,
                    outcome.job.input.display(),
                    result.translated_count
                ),
                Err(e) => log::error!(
                    "[{}/{}] {} failed: {}",
                    done + 1,
                    total,
                    outcome.job.input.display(),
                    e
                ),
            }
            slots[index] = Some(outcome);
        }
    });

    slots.into_iter().flatten().collect()
}

fn next_job(queue: &Mutex<VecDeque<(usize, BatchJob)>>) -> Option<(usize, BatchJob)> {
    match queue.lock() {
        Ok(mut jobs) => jobs.pop_front(),
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}
