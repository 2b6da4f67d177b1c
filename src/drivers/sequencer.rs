//! Bring-up sequence
//!
//! ```text
//! Reset → PoweredUp → PatchLoaded → ImageLoaded → Booted → Ready
//! ```
//!
//! Every step blocks on fixed delays; the chip has no ready line.

use crate::error::Result;
use crate::hal::transport::Transport;
use crate::protocol::reply::{PartInfo, SystemState};
use crate::types::{DeviceMode, DeviceState};

use super::loader::{FirmwareArtifact, FirmwareStore};
use super::si46xx::Si46xx;

/// Diagnostics gathered at the end of a bring-up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootReport {
    /// Mode the chip was brought up in
    pub mode: DeviceMode,
    /// Running image, `None` if the query failed
    pub system_state: Option<SystemState>,
    /// Part identification, `None` if the query failed
    pub part_info: Option<PartInfo>,
}

impl<T: Transport> Si46xx<T> {
    /// Reset the chip and boot it into `mode`
    ///
    /// Always starts from a reset pulse, so calling this on a running chip
    /// drops the current tuning. Images come from `store`: first the ROM
    /// patch, then the application image for `mode`.
    pub fn bring_up<S: FirmwareStore>(&mut self, mode: DeviceMode, store: &mut S) -> Result<BootReport, T::Error> {
        self.bring_up_with(mode, store, |_| {})
    }

    /// [`bring_up`](Self::bring_up), reporting each state as it is reached
    pub fn bring_up_with<S, F>(&mut self, mode: DeviceMode, store: &mut S, mut observer: F) -> Result<BootReport, T::Error>
    where
        S: FirmwareStore,
        F: FnMut(DeviceState),
    {
        info!("bringing up {} mode", mode);
        self.state = None;
        self.mode = None;

        let mut report = BootReport {
            mode,
            system_state: None,
            part_info: None,
        };

        let mut next = Some(DeviceState::Reset);
        while let Some(state) = next {
            self.enter(state, mode, store, &mut report)?;
            self.state = Some(state);
            info!("state: {}", state);
            observer(state);
            next = state.next();
        }

        self.mode = Some(mode);
        info!("{} ready", mode);
        Ok(report)
    }

    fn enter<S: FirmwareStore>(
        &mut self,
        state: DeviceState,
        mode: DeviceMode,
        store: &mut S,
        report: &mut BootReport,
    ) -> Result<(), T::Error> {
        match state {
            DeviceState::Reset => self.reset(),
            DeviceState::PoweredUp => self.power_up().map(drop),
            DeviceState::PatchLoaded => self.load_artifact(store, FirmwareArtifact::Patch).map(drop),
            DeviceState::ImageLoaded => self
                .load_artifact(store, FirmwareArtifact::for_mode(mode))
                .map(drop),
            DeviceState::Booted => self.boot().map(drop),
            DeviceState::Ready => {
                // Diagnostics only; a failed query does not undo the boot
                report.system_state = match self.get_system_state() {
                    Ok(state) => {
                        info!("system state: {}", state);
                        Some(state)
                    }
                    Err(e) => {
                        warn!("GET_SYS_STATE failed: {}", e);
                        None
                    }
                };
                report.part_info = match self.get_part_info() {
                    Ok(info) => {
                        info!("part info: {}", info);
                        Some(info)
                    }
                    Err(e) => {
                        warn!("GET_PART_INFO failed: {}", e);
                        None
                    }
                };
                Ok(())
            }
        }
    }
}
