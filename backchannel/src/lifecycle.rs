use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Module lifecycle, in the order a client moves through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModulePhase {
    Construct,
    Init,
    Load,
    Start,
    Ready,
    Destroy,
    Destroyed,
}

impl ModulePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ModulePhase::Construct,
            1 => ModulePhase::Init,
            2 => ModulePhase::Load,
            3 => ModulePhase::Start,
            4 => ModulePhase::Ready,
            5 => ModulePhase::Destroy,
            _ => ModulePhase::Destroyed,
        }
    }
}

/// Shared phase signal read by every component.
#[derive(Debug)]
pub struct Lifecycle {
    phase: AtomicU8,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(ModulePhase::Construct as u8),
        }
    }

    pub fn phase(&self) -> ModulePhase {
        ModulePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn set_phase(&self, phase: ModulePhase) {
        let previous = self.phase.swap(phase as u8, Ordering::AcqRel);
        tracing::debug!(
            "[Lifecycle] {:?} -> {:?}",
            ModulePhase::from_u8(previous),
            phase
        );
    }

    /// First-time initialization has completed. Stays true through unload.
    pub fn is_initialized(&self) -> bool {
        self.phase() >= ModulePhase::Start
    }

    /// Unload has begun. Nothing may leave the client from here on.
    pub fn is_unloading(&self) -> bool {
        self.phase() >= ModulePhase::Destroy
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == ModulePhase::Ready
    }

    /// Handler registration is expected before the client starts.
    pub fn accepts_registration(&self) -> bool {
        self.phase() <= ModulePhase::Load
    }
}
