use std::{process::Stdio, time::Duration};

use fanctl_common::{IpmiConfig, RawCommand};
use tokio::process::Command;
use tracing::debug;

/// Outcome of one external command. Gateway calls never fail outright:
/// timeouts and spawn errors come back as a non-zero status with the cause
/// in `stderr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[cfg(test)]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: 1,
            stdout: String::new(),
            stderr: detail.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    pub fn detail(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            "no error output"
        } else {
            stderr
        }
    }
}

/// Boundary to the BMC: sensor listing plus the raw fan commands.
pub trait FanGateway {
    async fn read_sensors(&self) -> CommandOutput;
    async fn set_auto_mode(&self, enabled: bool) -> CommandOutput;
    async fn set_duty_cycle(&self, percent: u8) -> CommandOutput;
}

impl<T: FanGateway> FanGateway for &T {
    async fn read_sensors(&self) -> CommandOutput {
        (**self).read_sensors().await
    }

    async fn set_auto_mode(&self, enabled: bool) -> CommandOutput {
        (**self).set_auto_mode(enabled).await
    }

    async fn set_duty_cycle(&self, percent: u8) -> CommandOutput {
        (**self).set_duty_cycle(percent).await
    }
}

/// `ipmitool` over the network, one subprocess per call.
#[derive(Debug, Clone)]
pub struct IpmiTool {
    program: String,
    connection_args: Vec<String>,
    timeout: Duration,
}

impl IpmiTool {
    pub fn new(config: &IpmiConfig, timeout: Duration) -> Self {
        Self {
            program: config.ipmitool_cmd.clone(),
            connection_args: connection_args(config),
            timeout,
        }
    }

    async fn run(&self, args: &[String]) -> CommandOutput {
        debug!("running {} {}", self.program, args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(&self.connection_args)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => CommandOutput {
                status: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Ok(Err(err)) => CommandOutput::failed(format!("failed to run {}: {err}", self.program)),
            Err(_) => CommandOutput::failed(format!(
                "{} timed out after {:?}",
                self.program, self.timeout
            )),
        }
    }
}

impl FanGateway for IpmiTool {
    async fn read_sensors(&self) -> CommandOutput {
        self.run(&["sensor".to_string()]).await
    }

    async fn set_auto_mode(&self, enabled: bool) -> CommandOutput {
        self.run(&RawCommand::AutoMode(enabled).to_args()).await
    }

    async fn set_duty_cycle(&self, percent: u8) -> CommandOutput {
        self.run(&RawCommand::SetDuty(percent).to_args()).await
    }
}

fn connection_args(config: &IpmiConfig) -> Vec<String> {
    vec![
        "-I".to_string(),
        config.interface.clone(),
        "-H".to_string(),
        config.host.clone(),
        "-U".to_string(),
        config.user.clone(),
        "-P".to_string(),
        config.password.clone(),
    ]
}
