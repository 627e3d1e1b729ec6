//! CPU and memory load via `sysinfo`.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use sysinfo::{MINIMUM_CPU_UPDATE_INTERVAL, System};

use crate::{
    builtin::ticks,
    error::SourceError,
    sources::{SourceFn, SourceRef},
    state::Update,
};

/// Load source writing global CPU usage into `cpu_slot` and used memory into
/// `mem_slot`, both as whole percentages, every `every`.
///
/// Each attempt owns its own `System`; the first sample waits
/// [`MINIMUM_CPU_UPDATE_INTERVAL`] so the CPU figure is meaningful.
pub fn load(cpu_slot: impl Into<String>, mem_slot: impl Into<String>, every: Duration) -> SourceRef {
    let cpu_slot = cpu_slot.into();
    let mem_slot = mem_slot.into();
    SourceFn::arc("load", [cpu_slot.clone(), mem_slot.clone()], move || {
        let cpu_slot = cpu_slot.clone();
        let mem_slot = mem_slot.clone();
        let warm_up = stream::once(async {
            let mut sys = System::new();
            sys.refresh_cpu_all();
            tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
            sys
        });
        warm_up.flat_map(move |sys| {
            let cpu_slot = cpu_slot.clone();
            let mem_slot = mem_slot.clone();
            ticks(every).scan(sys, move |sys, ()| {
                sys.refresh_cpu_all();
                sys.refresh_memory();
                let mut update = Update::new().set(cpu_slot.as_str(), whole_percent(sys.global_cpu_usage()));
                update.insert(mem_slot.as_str(), ratio_percent(sys.used_memory(), sys.total_memory()));
                std::future::ready(Some(Ok::<_, SourceError>(update)))
            })
        })
    })
}

fn whole_percent(value: f32) -> String {
    format!("{:.0}%", value.clamp(0.0, 100.0))
}

/// `None` when `total` is unknown (reported as zero).
fn ratio_percent(used: u64, total: u64) -> Option<String> {
    if total == 0 {
        return None;
    }
    Some(whole_percent((used as f64 / total as f64 * 100.0) as f32))
}
