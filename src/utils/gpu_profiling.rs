use std::collections::HashMap;
use wgpu_profiler::{GpuProfiler, GpuProfilerSettings, GpuTimerQueryResult};
use crate::error::{ParticlesError, Result};
use crate::renderer::wgpu_context::WgpuContext;

/// Number of frames averaged into one timing report.
const REPORT_INTERVAL_FRAMES: u64 = 600;

#[derive(Default)]
struct ScopeTotals {
    total_ms: f64,
    samples: u64,
}

/// GPU pass timings, averaged and logged periodically.
///
/// Timer queries are only written when the device has the timestamp
/// features; otherwise scopes are plain encoder passthroughs.
pub struct PassTimings {
    profiler: GpuProfiler,
    timestamp_period: f32,
    totals: HashMap<String, ScopeTotals>,
    frames: u64,
}

impl PassTimings {
    pub fn new(wgpu_context: &WgpuContext) -> Result<Self> {
        let settings = GpuProfilerSettings {
            enable_timer_queries: wgpu_context.supports_profiling(),
            ..Default::default()
        };
        let profiler = GpuProfiler::new(wgpu_context.get_device(), settings)
            .map_err(|e| ParticlesError::ResourceAllocation(format!("gpu profiler: {e:?}")))?;

        Ok(Self {
            profiler,
            timestamp_period: wgpu_context.get_queue().get_timestamp_period(),
            totals: HashMap::new(),
            frames: 0,
        })
    }

    pub fn profiler(&self) -> &GpuProfiler {
        &self.profiler
    }

    pub fn resolve(&mut self, encoder: &mut wgpu::CommandEncoder) {
        self.profiler.resolve_queries(encoder);
    }

    /// Call once per frame after the frame's commands were submitted.
    pub fn end_frame(&mut self) {
        if let Err(e) = self.profiler.end_frame() {
            log::trace!("GPU profiler frame dropped: {e:?}");
            return;
        }

        if let Some(results) = self.profiler.process_finished_frame(self.timestamp_period) {
            self.accumulate(&results);
        }

        self.frames += 1;
        if self.frames % REPORT_INTERVAL_FRAMES == 0 {
            self.report();
        }
    }

    fn accumulate(&mut self, results: &[GpuTimerQueryResult]) {
        for result in results {
            if let Some(time) = &result.time {
                let totals = self.totals.entry(result.label.clone()).or_default();
                totals.total_ms += (time.end - time.start) * 1000.0;
                totals.samples += 1;
            }
            self.accumulate(&result.nested_queries);
        }
    }

    fn report(&mut self) {
        for (label, totals) in &self.totals {
            if totals.samples > 0 {
                log::debug!(
                    "{:<10}: {:.4} ms ({} samples)",
                    label,
                    totals.total_ms / totals.samples as f64,
                    totals.samples
                );
            }
        }
        self.totals.clear();
    }
}
