//! Supermicro-style raw fan commands (`ipmitool raw 0x30 0x30 ...`).

pub const NETFN_OEM: u8 = 0x30;
pub const CMD_FAN: u8 = 0x30;
pub const SUBCMD_AUTO_MODE: u8 = 0x01;
pub const SUBCMD_SET_DUTY: u8 = 0x02;
pub const ZONE_ALL: u8 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawCommand {
    AutoMode(bool),
    SetDuty(u8),
}

impl RawCommand {
    pub fn bytes(self) -> Vec<u8> {
        match self {
            Self::AutoMode(enabled) => {
                vec![NETFN_OEM, CMD_FAN, SUBCMD_AUTO_MODE, u8::from(enabled)]
            }
            Self::SetDuty(percent) => {
                vec![NETFN_OEM, CMD_FAN, SUBCMD_SET_DUTY, ZONE_ALL, percent.min(100)]
            }
        }
    }

    /// Arguments after the connection options, e.g.
    /// `["raw", "0x30", "0x30", "0x02", "0xff", "0x28"]`.
    pub fn to_args(self) -> Vec<String> {
        std::iter::once("raw".to_string())
            .chain(self.bytes().into_iter().map(|byte| format!("0x{byte:02x}")))
            .collect()
    }
}
