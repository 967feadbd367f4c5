//! Host callback registrations, grounded on `CoSimClient`/`CoSimServer`'s
//! `Set*Callback` family. Every field is optional; an unset callback is
//! simply not invoked.

use cosim_protocol::types::TerminateReason;

type VoidCallback = Box<dyn Fn() + Send + Sync>;
type StepCallback = Box<dyn Fn(i64) + Send + Sync>;
type TerminateCallback = Box<dyn Fn(TerminateReason) + Send + Sync>;

#[derive(Default)]
pub struct Callbacks {
    pub on_simulation_started: Option<VoidCallback>,
    pub on_simulation_stopped: Option<VoidCallback>,
    pub on_simulation_paused: Option<VoidCallback>,
    pub on_simulation_continued: Option<VoidCallback>,
    pub on_simulation_terminated: Option<TerminateCallback>,
    pub on_begin_step: Option<StepCallback>,
    pub on_end_step: Option<StepCallback>,
}

impl Callbacks {
    fn fire_void(cb: &Option<VoidCallback>) {
        if let Some(f) = cb {
            f();
        }
    }

    pub fn fire_started(&self) {
        Self::fire_void(&self.on_simulation_started);
    }

    pub fn fire_stopped(&self) {
        Self::fire_void(&self.on_simulation_stopped);
    }

    pub fn fire_paused(&self) {
        Self::fire_void(&self.on_simulation_paused);
    }

    pub fn fire_continued(&self) {
        Self::fire_void(&self.on_simulation_continued);
    }

    pub fn fire_terminated(&self, reason: TerminateReason) {
        if let Some(f) = &self.on_simulation_terminated {
            f(reason);
        }
    }

    pub fn fire_begin_step(&self, simulation_time: i64) {
        if let Some(f) = &self.on_begin_step {
            f(simulation_time);
        }
    }

    pub fn fire_end_step(&self, simulation_time: i64) {
        if let Some(f) = &self.on_end_step {
            f(simulation_time);
        }
    }
}
