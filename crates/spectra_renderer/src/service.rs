//! Background render thread driven by a request queue.
//!
//! The service owns the [`Renderer`] on a dedicated thread. Requests are
//! processed in submission order; each returns a [`RenderHandle`] that can
//! cancel the request, poll progress, and collect the outcome.

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::renderer::{CameraUpdate, CancelFlag, RenderOutput, RenderProgress, RenderStats, Renderer};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Work the render thread can be asked to do.
#[derive(Debug, Clone)]
pub enum RenderRequest {
    /// Full render in the configured mode
    Render,
    /// Add `passes` progressive passes to the running average
    Progressive { passes: u32 },
    UpdateCamera(CameraUpdate),
    SetConfig(Box<RenderConfig>),
}

/// Result of a finished request.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Rendered { stats: RenderStats, output: RenderOutput },
    Updated,
}

impl RenderOutcome {
    pub fn output(&self) -> Option<&RenderOutput> {
        match self {
            RenderOutcome::Rendered { output, .. } => Some(output),
            RenderOutcome::Updated => None,
        }
    }

    pub fn stats(&self) -> Option<&RenderStats> {
        match self {
            RenderOutcome::Rendered { stats, .. } => Some(stats),
            RenderOutcome::Updated => None,
        }
    }
}

struct Job {
    request: RenderRequest,
    cancel: CancelFlag,
    reply: Sender<RenderResult<RenderOutcome>>,
}

/// Caller's side of a submitted request.
pub struct RenderHandle {
    cancel: CancelFlag,
    progress: Arc<RenderProgress>,
    reply: Receiver<RenderResult<RenderOutcome>>,
}

impl RenderHandle {
    /// Ask the request to stop; samples taken so far are kept.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fraction of pixels finished in the pass the service is running.
    pub fn progress(&self) -> f32 {
        self.progress.fraction()
    }

    /// Block until the request finishes.
    pub fn wait(self) -> RenderResult<RenderOutcome> {
        self.reply.recv().map_err(|_| RenderError::ServiceClosed)?
    }

    /// The outcome if the request already finished.
    pub fn try_result(&self) -> Option<RenderResult<RenderOutcome>> {
        match self.reply.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RenderError::ServiceClosed)),
        }
    }
}

/// Owns a renderer on its own thread.
pub struct RenderService {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<Renderer>>,
    progress: Arc<RenderProgress>,
}

impl RenderService {
    /// Move `renderer` onto a new render thread.
    pub fn spawn(renderer: Renderer) -> RenderResult<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let progress = renderer.progress_tracker();
        let worker = std::thread::Builder::new()
            .name("spectra-render".into())
            .spawn(move || run(renderer, receiver))?;
        info!("Render service started");

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            progress,
        })
    }

    /// Queue a request behind any already submitted.
    pub fn submit(&self, request: RenderRequest) -> RenderResult<RenderHandle> {
        let sender = self.sender.as_ref().ok_or(RenderError::ServiceClosed)?;
        let (reply, receiver) = crossbeam_channel::bounded(1);
        let cancel = CancelFlag::new();
        sender
            .send(Job {
                request,
                cancel: cancel.clone(),
                reply,
            })
            .map_err(|_| RenderError::ServiceClosed)?;

        Ok(RenderHandle {
            cancel,
            progress: Arc::clone(&self.progress),
            reply: receiver,
        })
    }

    /// Finish queued requests, stop the thread and hand the renderer back.
    pub fn shutdown(mut self) -> RenderResult<Renderer> {
        self.sender.take();
        let worker = self.worker.take().ok_or(RenderError::ServiceClosed)?;
        worker.join().map_err(|_| RenderError::WorkerPanicked)
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(mut renderer: Renderer, receiver: Receiver<Job>) -> Renderer {
    for job in receiver.iter() {
        let result = handle(&mut renderer, job.request, &job.cancel);
        // The caller may have dropped its handle
        let _ = job.reply.send(result);
    }
    debug!("Render service stopping");
    renderer
}

fn handle(renderer: &mut Renderer, request: RenderRequest, cancel: &CancelFlag) -> RenderResult<RenderOutcome> {
    match request {
        RenderRequest::Render => {
            let stats = renderer.render_configured(cancel);
            Ok(RenderOutcome::Rendered {
                stats,
                output: renderer.export(),
            })
        }
        RenderRequest::Progressive { passes } => {
            let mut stats = None;
            for _ in 0..passes {
                let pass = renderer.render_progressive_pass(cancel);
                stats = Some(pass);
                if !pass.completed {
                    break;
                }
            }
            let stats = stats.unwrap_or(RenderStats {
                passes: renderer.passes(),
                samples_committed: 0,
                samples_discarded: 0,
                elapsed: Default::default(),
                completed: true,
            });
            Ok(RenderOutcome::Rendered {
                stats,
                output: renderer.export(),
            })
        }
        RenderRequest::UpdateCamera(update) => {
            renderer.update_camera(update)?;
            Ok(RenderOutcome::Updated)
        }
        RenderRequest::SetConfig(config) => {
            renderer.set_config(*config)?;
            Ok(RenderOutcome::Updated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Diffuse, SceneBuilder, Spd, Sphere};
    use spectra_math::{Transform, Vec3};

    fn service() -> RenderService {
        let config = RenderConfig {
            threads: 2,
            ..RenderConfig::default().with_resolution(8, 8).with_quality(2, 3)
        };
        let mut builder = SceneBuilder::new();
        builder.add_shape(
            Arc::new(Sphere::new(1.0)),
            Arc::new(Diffuse::new(Spd::constant(0.5))),
            Transform::from_translation(Vec3::new(0.0, 0.0, -3.0)),
        );
        let scene = builder.build(&config).unwrap();
        RenderService::spawn(Renderer::new(config, scene).unwrap()).unwrap()
    }

    #[test]
    fn test_requests_run_in_order() {
        let service = service();
        let first = service.submit(RenderRequest::Progressive { passes: 2 }).unwrap();
        let moved = service
            .submit(RenderRequest::UpdateCamera(CameraUpdate::Move(Vec3::X)))
            .unwrap();
        let second = service.submit(RenderRequest::Progressive { passes: 1 }).unwrap();

        assert_eq!(first.wait().unwrap().stats().unwrap().passes, 2);
        assert!(matches!(moved.wait().unwrap(), RenderOutcome::Updated));
        // The camera move reset the accumulation
        let outcome = second.wait().unwrap();
        assert_eq!(outcome.stats().unwrap().passes, 1);
        assert_eq!(outcome.output().unwrap().color.len(), 8 * 8 * 3);

        let renderer = service.shutdown().unwrap();
        assert_eq!(renderer.passes(), 1);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let service = service();
        let bad = RenderConfig::default().with_quality(0, 1);
        let handle = service.submit(RenderRequest::SetConfig(Box::new(bad))).unwrap();
        assert!(matches!(handle.wait(), Err(RenderError::Config(_))));

        // The service keeps running on the old configuration
        let handle = service.submit(RenderRequest::Render).unwrap();
        assert!(handle.wait().unwrap().stats().unwrap().completed);
    }

    #[test]
    fn test_cancelled_request_finishes() {
        let service = service();
        let handle = service.submit(RenderRequest::Progressive { passes: 1000 }).unwrap();
        handle.cancel();
        let stats = *handle.wait().unwrap().stats().unwrap();
        assert!(stats.passes < 1000);
    }
}
