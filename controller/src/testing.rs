use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use crate::ipmi::{CommandOutput, FanGateway};

pub const SENSOR_LISTING: &str = "\
CPU1 Temp        | 45.200     | degrees C  | ok
CPU2 Temp        | 71.000     | degrees C  | ok
System Temp      | 60.500     | degrees C  | ok
FAN1             | 1400.000   | RPM        | ok
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    ReadSensors,
    SetAuto(bool),
    SetDuty(u8),
}

/// Records every gateway call; failures and latency are switchable.
#[derive(Debug)]
pub struct MockGateway {
    sensors: Mutex<CommandOutput>,
    calls: Mutex<Vec<Call>>,
    pub fail_disable_auto: AtomicBool,
    pub fail_set_duty: AtomicBool,
    read_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockGateway {
    pub fn new(sensor_listing: &str) -> Self {
        Self {
            sensors: Mutex::new(CommandOutput::ok(sensor_listing)),
            calls: Mutex::new(Vec::new()),
            fail_disable_auto: AtomicBool::new(false),
            fail_set_duty: AtomicBool::new(false),
            read_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn set_sensor_output(&self, output: CommandOutput) {
        *self.sensors.lock().unwrap() = output;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn duty_writes(&self) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SetDuty(percent) => Some(percent),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().iter().filter(|recorded| **recorded == call).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl FanGateway for MockGateway {
    async fn read_sensors(&self) -> CommandOutput {
        self.record(Call::ReadSensors);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.sensors.lock().unwrap().clone()
    }

    async fn set_auto_mode(&self, enabled: bool) -> CommandOutput {
        self.record(Call::SetAuto(enabled));
        if !enabled && self.fail_disable_auto.load(Ordering::SeqCst) {
            return CommandOutput::failed("Invalid command");
        }
        CommandOutput::ok("")
    }

    async fn set_duty_cycle(&self, percent: u8) -> CommandOutput {
        self.record(Call::SetDuty(percent));
        if self.fail_set_duty.load(Ordering::SeqCst) {
            return CommandOutput::failed("Unable to send RAW command");
        }
        CommandOutput::ok("")
    }
}
