//! # Protocol Command Codec
//!
//! Privileged commands accepted by the exchange's `protocol_cmd` entry point.
//!
//! ## Wire format
//! A command is a flat byte string: a one-byte opcode followed by the
//! payload fields in declaration order.
//!
//! | Field   | Encoding                                              |
//! |---------|-------------------------------------------------------|
//! | opcode  | `u8`                                                  |
//! | address | `u32` big-endian length, then the address's XDR bytes |
//! | slot    | `u16` big-endian                                      |
//! | flag    | `u8`, `0` or `1`                                      |
//!
//! Inside the contracts a command is always handled as [`ProtocolCmd`]; the
//! byte form exists only at the boundary with the exchange.

use soroban_sdk::{
    xdr::{FromXdr, ToXdr},
    Address, Bytes, Env,
};

/// Reassign the exchange's authority pointer.
pub const AUTHORITY_TRANSFER_CODE: u8 = 20;
/// Install a new module at a proxy slot.
pub const UPGRADE_DEX_CODE: u8 = 21;
/// Open or close the hot (swap) path.
pub const HOT_OPEN_CODE: u8 = 22;
/// Enter or leave safe mode.
pub const SAFE_MODE_CODE: u8 = 23;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProtocolCmd {
    AuthorityTransfer(Address),
    ModuleUpgrade { module: Address, slot: u16 },
    HotPath(bool),
    SafeMode(bool),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    Empty,
    UnknownOpcode(u8),
    Truncated,
    TrailingBytes,
    InvalidAddress,
    InvalidFlag(u8),
}

impl ProtocolCmd {
    pub fn opcode(&self) -> u8 {
        match self {
            ProtocolCmd::AuthorityTransfer(_) => AUTHORITY_TRANSFER_CODE,
            ProtocolCmd::ModuleUpgrade { .. } => UPGRADE_DEX_CODE,
            ProtocolCmd::HotPath(_) => HOT_OPEN_CODE,
            ProtocolCmd::SafeMode(_) => SAFE_MODE_CODE,
        }
    }

    /// Upgrade-class commands are only applied when sent with `sudo`.
    pub fn requires_sudo(&self) -> bool {
        is_sudo_opcode(self.opcode())
    }

    pub fn encode(&self, env: &Env) -> Bytes {
        let mut out = Bytes::new(env);
        out.push_back(self.opcode());
        match self {
            ProtocolCmd::AuthorityTransfer(auth) => put_address(env, &mut out, auth),
            ProtocolCmd::ModuleUpgrade { module, slot } => {
                put_address(env, &mut out, module);
                out.extend_from_array(&slot.to_be_bytes());
            }
            ProtocolCmd::HotPath(flag) | ProtocolCmd::SafeMode(flag) => {
                out.push_back(u8::from(*flag));
            }
        }
        out
    }

    pub fn decode(env: &Env, bytes: &Bytes) -> Result<Self, DecodeError> {
        let mut r = Reader { bytes, pos: 0 };
        let opcode = r.u8().map_err(|_| DecodeError::Empty)?;
        let cmd = match opcode {
            AUTHORITY_TRANSFER_CODE => ProtocolCmd::AuthorityTransfer(r.address(env)?),
            UPGRADE_DEX_CODE => {
                let module = r.address(env)?;
                let slot = r.u16()?;
                ProtocolCmd::ModuleUpgrade { module, slot }
            }
            HOT_OPEN_CODE => ProtocolCmd::HotPath(r.flag()?),
            SAFE_MODE_CODE => ProtocolCmd::SafeMode(r.flag()?),
            other => return Err(DecodeError::UnknownOpcode(other)),
        };
        r.finish()?;
        Ok(cmd)
    }
}

/// Reads the opcode of an encoded command without decoding its payload.
pub fn opcode_of(bytes: &Bytes) -> Option<u8> {
    bytes.first()
}

pub fn is_sudo_opcode(opcode: u8) -> bool {
    matches!(opcode, AUTHORITY_TRANSFER_CODE | UPGRADE_DEX_CODE)
}

fn put_address(env: &Env, out: &mut Bytes, address: &Address) {
    let raw = address.clone().to_xdr(env);
    out.extend_from_array(&raw.len().to_be_bytes());
    out.append(&raw);
}

struct Reader<'a> {
    bytes: &'a Bytes,
    pos: u32,
}

impl Reader<'_> {
    fn u8(&mut self) -> Result<u8, DecodeError> {
        let b = self.bytes.get(self.pos).ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes([self.u8()?, self.u8()?]))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes([
            self.u8()?,
            self.u8()?,
            self.u8()?,
            self.u8()?,
        ]))
    }

    fn flag(&mut self) -> Result<bool, DecodeError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidFlag(other)),
        }
    }

    fn address(&mut self, env: &Env) -> Result<Address, DecodeError> {
        let len = self.u32()?;
        let end = self.pos.checked_add(len).ok_or(DecodeError::Truncated)?;
        if end > self.bytes.len() {
            return Err(DecodeError::Truncated);
        }
        let raw = self.bytes.slice(self.pos..end);
        self.pos = end;
        Address::from_xdr(env, &raw).map_err(|_| DecodeError::InvalidAddress)
    }

    fn finish(self) -> Result<(), DecodeError> {
        if self.pos != self.bytes.len() {
            return Err(DecodeError::TrailingBytes);
        }
        Ok(())
    }
}
