//! Single-thread classification queue with a bounded wait.
//!
//! The worker builds the classifier on its own thread, so engines holding
//! thread-bound native handles never cross threads. Requests are served one at
//! a time in arrival order, which serializes access to the engine.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info};

use super::catalog::SymbolId;
use super::classifier::Recognizer;
use super::error::RecognitionError;
use super::stroke::NormalizedPoint;

type Reply = Result<Vec<SymbolId>, RecognitionError>;

struct Request {
    points: Vec<NormalizedPoint>,
    k: usize,
    reply: Sender<Reply>,
}

/// Handle to the classification thread.
pub struct ClassifierWorker {
    requests: Option<Sender<Request>>,
    timeout: Duration,
    handle: Option<JoinHandle<()>>,
}

impl ClassifierWorker {
    /// Start the worker and wait for `build` to finish on it.
    ///
    /// Construction errors (a missing model, a class table mismatch) are
    /// returned here, at startup.
    pub fn spawn<R, F>(build: F, timeout: Duration) -> Result<Self, RecognitionError>
    where
        R: Recognizer + 'static,
        F: FnOnce() -> Result<R, RecognitionError> + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), RecognitionError>>();
        let handle = thread::Builder::new()
            .name("hwyla-classifier".into())
            .spawn(move || match build() {
                Ok(recognizer) => {
                    let _ = ready_tx.send(Ok(()));
                    serve(recognizer, request_rx);
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .map_err(|err| {
                RecognitionError::RecognitionFailure(format!("failed to start classifier: {err}"))
            })?;
        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("Classifier worker ready (timeout {timeout:?})");
                Ok(Self {
                    requests: Some(request_tx),
                    timeout,
                    handle: Some(handle),
                })
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(RecognitionError::WorkerStopped)
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn serve<R: Recognizer>(recognizer: R, requests: Receiver<Request>) {
    for request in requests {
        let result = recognizer.recognize(&request.points, request.k);
        // The caller may have timed out and dropped its receiver.
        let _ = request.reply.send(result);
    }
}

impl Recognizer for ClassifierWorker {
    fn recognize(
        &self,
        points: &[NormalizedPoint],
        k: usize,
    ) -> Result<Vec<SymbolId>, RecognitionError> {
        let requests = self.requests.as_ref().ok_or(RecognitionError::WorkerStopped)?;
        let (reply_tx, reply_rx) = mpsc::channel();
        requests
            .send(Request {
                points: points.to_vec(),
                k,
                reply: reply_tx,
            })
            .map_err(|_| RecognitionError::WorkerStopped)?;
        match reply_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                error!("Inference exceeded {:?}", self.timeout);
                Err(RecognitionError::InferenceTimeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(RecognitionError::WorkerStopped),
        }
    }
}

impl Drop for ClassifierWorker {
    fn drop(&mut self) {
        // Closing the queue ends the serve loop once the current request is done.
        self.requests.take();
        if let Some(handle) = self.handle.take()
            && handle.is_finished()
        {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl Recognizer for Echo {
        fn recognize(
            &self,
            points: &[NormalizedPoint],
            k: usize,
        ) -> Result<Vec<SymbolId>, RecognitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok((0..k.min(points.len()) as u32).map(SymbolId).collect())
        }
    }

    fn points(n: usize) -> Vec<NormalizedPoint> {
        vec![
            NormalizedPoint {
                dt: 0.0,
                nx: 0.0,
                ny: 0.0
            };
            n
        ]
    }

    #[test]
    fn serves_requests_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let worker = ClassifierWorker::spawn(
            move || {
                Ok(Echo {
                    calls: counter,
                    delay: Duration::ZERO,
                })
            },
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            worker.recognize(&points(5), 2).unwrap(),
            vec![SymbolId(0), SymbolId(1)]
        );
        assert_eq!(worker.recognize(&points(1), 3).unwrap(), vec![SymbolId(0)]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn build_failure_surfaces_at_spawn() {
        let result = ClassifierWorker::spawn(
            || -> Result<Echo, RecognitionError> {
                Err(RecognitionError::model_load("model.tflite", "missing"))
            },
            Duration::from_secs(1),
        );
        assert!(matches!(result.err().unwrap(), RecognitionError::ModelLoad { .. }));
    }

    #[test]
    fn slow_inference_times_out() {
        let worker = ClassifierWorker::spawn(
            || {
                Ok(Echo {
                    calls: Arc::new(AtomicUsize::new(0)),
                    delay: Duration::from_millis(500),
                })
            },
            Duration::from_millis(20),
        )
        .unwrap();
        let err = worker.recognize(&points(2), 1).unwrap_err();
        assert!(matches!(err, RecognitionError::InferenceTimeout(_)));
        assert!(err.is_fatal());
    }
}
