//! `Si468x` FM/FM-HD/DAB Receiver Driver
//!
//! Typed wrappers for the chip commands needed to tune and monitor the
//! receiver. Every command is one write frame followed by one fixed-length
//! read frame; the DAB service list is the only dynamic-length reply.
//!
//! The driver owns its transport and every operation takes `&mut self`, so
//! a command and its reply can never interleave with another command. Hosts
//! sharing one driver between threads must wrap the whole driver in a lock.

use crate::config::{
    Config, BOOT_DELAY_MS, DYNAMIC_HEADER_LEN, POWER_UP_DELAY_MS, RESET_DELAY_MS,
};
use crate::error::{ArgumentError, Error, Result};
use crate::hal::transport::{PinLevel, Transport};
use crate::protocol::command::{self, Command, DIGRAD_ACK_ARGS, NO_ARGS};
use crate::protocol::frame::{DynamicReply, FrameBus};
use crate::protocol::reply::{
    DabDigradStatus, FmRdsStatus, FmRsqStatus, PartInfo, StatusFlags, SystemState,
};
use crate::protocol::service_list::{parse_service_list, ServiceList, ServiceRecord};
use crate::types::{DeviceMode, DeviceState};

/// `Si468x` driver
pub struct Si46xx<T> {
    pub(super) bus: FrameBus<T>,
    pub(super) config: Config,
    pub(super) state: Option<DeviceState>,
    pub(super) mode: Option<DeviceMode>,
}

impl<T: Transport> Si46xx<T> {
    /// Create a driver with the default configuration
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, Config::default())
    }

    /// Create a driver with an explicit configuration
    #[must_use]
    pub fn with_config(transport: T, config: Config) -> Self {
        Self {
            bus: FrameBus::new(transport),
            config,
            state: None,
            mode: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Last bring-up state reached, `None` before the first bring-up
    pub fn state(&self) -> Option<DeviceState> {
        self.state
    }

    /// Mode of the last completed bring-up
    pub fn mode(&self) -> Option<DeviceMode> {
        self.mode
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        self.bus.transport()
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.bus.transport_mut()
    }

    /// Give back the transport
    pub fn release(self) -> T {
        self.bus.release()
    }

    /// Pulse the reset line
    ///
    /// The chip forgets any loaded image; a full bring-up must follow.
    pub fn reset(&mut self) -> Result<(), T::Error> {
        self.bus.set_reset(PinLevel::Low)?;
        self.bus.delay_ms(RESET_DELAY_MS);
        self.bus.set_reset(PinLevel::High)?;
        self.bus.delay_ms(RESET_DELAY_MS);
        self.state = Some(DeviceState::Reset);
        self.mode = None;
        Ok(())
    }

    /// Power up the chip and start the crystal oscillator
    pub fn power_up(&mut self) -> Result<StatusFlags, T::Error> {
        let args = self.config.power_up.encode();
        self.bus.write_command(Command::PowerUp, &args)?;
        self.bus.delay_ms(POWER_UP_DELAY_MS);
        let reply: [u8; 4] = self.bus.read_fixed()?;
        Ok(check_status(Command::PowerUp, &reply))
    }

    /// Boot the loaded image
    ///
    /// Blocks for the worst-case boot time; the chip reports no completion.
    pub fn boot(&mut self) -> Result<StatusFlags, T::Error> {
        self.bus.write_command(Command::Boot, &NO_ARGS)?;
        self.bus.delay_ms(BOOT_DELAY_MS);
        let reply: [u8; 4] = self.bus.read_fixed()?;
        Ok(check_status(Command::Boot, &reply))
    }

    /// Read the running image
    pub fn get_system_state(&mut self) -> Result<SystemState, T::Error> {
        let reply = self.bus.command(Command::GetSysState, &NO_ARGS)?;
        check_status(Command::GetSysState, &reply);
        Ok(SystemState::decode(&reply))
    }

    /// Read part number and revision
    pub fn get_part_info(&mut self) -> Result<PartInfo, T::Error> {
        let reply = self.bus.command(Command::GetPartInfo, &NO_ARGS)?;
        check_status(Command::GetPartInfo, &reply);
        Ok(PartInfo::decode(&reply))
    }

    /// Read the status bytes without sending a command
    pub fn poll_status(&mut self) -> Result<StatusFlags, T::Error> {
        let reply: [u8; 4] = self.bus.read_fixed()?;
        Ok(StatusFlags::from_reply(&reply))
    }

    /// Write a property
    pub fn set_property(&mut self, property: u16, value: u16) -> Result<StatusFlags, T::Error> {
        debug!("set_property({}, {})", property, value);
        self.status_command(Command::SetProperty, &command::set_property(property, value))
    }

    /// Tune to an FM frequency in kHz
    pub fn fm_tune_frequency(&mut self, khz: u32, antenna_cap: u16) -> Result<StatusFlags, T::Error> {
        let args = command::fm_tune_freq(khz, antenna_cap)?;
        debug!("fm_tune_frequency({} kHz)", khz);
        self.status_command(Command::FmTuneFreq, &args)
    }

    /// Read FM received signal quality
    pub fn fm_rsq_status(&mut self) -> Result<FmRsqStatus, T::Error> {
        let reply = self.bus.command(Command::FmRsqStatus, &NO_ARGS)?;
        check_status(Command::FmRsqStatus, &reply);
        let status = FmRsqStatus::decode(&reply);
        debug!("{}", status);
        Ok(status)
    }

    /// Read FM RDS decoder status
    pub fn fm_rds_status(&mut self) -> Result<FmRdsStatus, T::Error> {
        let reply = self.bus.command(Command::FmRdsStatus, &NO_ARGS)?;
        check_status(Command::FmRdsStatus, &reply);
        let status = FmRdsStatus::decode(&reply);
        debug!("{}", status);
        Ok(status)
    }

    /// Tune to entry `index` of the DAB frequency list
    pub fn dab_tune_frequency(&mut self, index: u8, antenna_cap: u8) -> Result<StatusFlags, T::Error> {
        debug!("dab_tune_frequency({})", index);
        self.status_command(Command::DabTuneFreq, &command::dab_tune_freq(index, antenna_cap))
    }

    /// Replace the DAB frequency list (1 to 48 frequencies in kHz)
    ///
    /// The list is validated before anything is sent.
    pub fn dab_set_frequency_list(&mut self, frequencies: &[u32]) -> Result<StatusFlags, T::Error> {
        let args = command::dab_set_freq_list(frequencies)?;
        debug!("dab_set_frequency_list({} entries)", frequencies.len());
        self.status_command(Command::DabSetFreqList, &args)
    }

    /// Start a DAB service component
    pub fn dab_start_digital_service(
        &mut self,
        service_id: u32,
        component_id: u32,
    ) -> Result<StatusFlags, T::Error> {
        let args = command::dab_start_digital_service(service_id, component_id);
        self.bus.write_command(Command::DabStartDigitalService, &args)?;
        let reply: [u8; 5] = self.bus.read_fixed()?;
        Ok(check_status(Command::DabStartDigitalService, &reply))
    }

    /// Start a service taken from a parsed service list
    pub fn dab_start_service(&mut self, service: &ServiceRecord) -> Result<StatusFlags, T::Error> {
        info!("starting service {} ({})", service.label(), service.service_id);
        self.dab_start_digital_service(service.service_id, u32::from(service.component_id))
    }

    /// Start service number `index` of a parsed service list
    pub fn dab_start_service_index(
        &mut self,
        list: &ServiceList,
        index: usize,
    ) -> Result<StatusFlags, T::Error> {
        let service = *list.get(index).ok_or(ArgumentError::ServiceIndex {
            index,
            len: list.len(),
        })?;
        self.dab_start_service(&service)
    }

    /// Read DAB link quality, acknowledging pending DIGRAD and STC interrupts
    pub fn dab_digrad_status(&mut self) -> Result<DabDigradStatus, T::Error> {
        let reply = self.bus.command(Command::DabDigradStatus, &DIGRAD_ACK_ARGS)?;
        check_status(Command::DabDigradStatus, &reply);
        let status = DabDigradStatus::decode(&reply);
        debug!("{}", status);
        Ok(status)
    }

    /// Read raw service linking information for `service_id`
    pub fn dab_service_linking_info(&mut self, service_id: u32) -> Result<[u8; 24], T::Error> {
        let args = command::dab_service_linking_info(service_id);
        let reply = self.bus.command(Command::DabGetServiceLinkingInfo, &args)?;
        check_status(Command::DabGetServiceLinkingInfo, &reply);
        Ok(reply)
    }

    /// Fetch and parse the DAB service list
    ///
    /// The chip may answer with a bare header while the ensemble is still
    /// being decoded, so the query is repeated per the configured
    /// [`RetryPolicy`](crate::config::RetryPolicy). When every attempt comes
    /// back empty the last reply is parsed anyway, giving an empty list,
    /// unless the policy is strict.
    pub fn dab_get_digital_service_list(&mut self) -> Result<ServiceList, T::Error> {
        let policy = self.config.service_list_retry;
        let mut reply = DynamicReply::new();
        let mut attempts = 0;

        while attempts < policy.attempts {
            attempts += 1;
            self.bus.write_command(Command::DabGetDigitalServiceList, &NO_ARGS)?;
            reply = self.bus.read_dynamic()?;
            if reply.len() > DYNAMIC_HEADER_LEN {
                break;
            }
            if policy.delay_ms > 0 && attempts < policy.attempts {
                self.bus.delay_ms(policy.delay_ms);
            }
        }

        if reply.len() <= DYNAMIC_HEADER_LEN {
            if policy.strict {
                return Err(Error::ProtocolTimeout { attempts });
            }
            warn!("service list not ready after {} attempts", attempts);
        }

        let list = parse_service_list(&reply)?;
        debug!("service list v{}: {} services", list.header.version, list.len());
        Ok(list)
    }

    fn status_command(&mut self, command: Command, args: &[u8]) -> Result<StatusFlags, T::Error> {
        let reply: [u8; 4] = self.bus.command(command, args)?;
        Ok(check_status(command, &reply))
    }
}

/// Decode the status bytes and report a rejected command
///
/// The chip keeps working after `ERR_CMD`; the flag is surfaced to the
/// caller rather than turned into an error.
fn check_status(command: Command, reply: &[u8]) -> StatusFlags {
    let status = StatusFlags::from_reply(reply);
    if status.err_cmd {
        warn!("{} rejected by chip", command);
    }
    status
}
