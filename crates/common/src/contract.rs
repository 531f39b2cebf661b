//! Contract descriptor and its bytecode layout.
//!
//! ```text
//! u8 len, bytes      language id (UTF-8)
//! i32                language version
//! u16, function*     triggers
//! u16, function*     public functions
//! u16, (u8, u8)*     state vars: index, data type
//! u16, (u8, u8, u8)* state maps: index, key type, value type
//! u8 [textual]       presence flag, then textual metadata
//! ```
//!
//! A `Contract` is plain data. Use the builder crate to validate it before
//! deployment.

use crate::codec::{Reader, Writer};
use crate::data_type::DataType;
use crate::error::DecodeError;
use crate::function::Function;
use crate::instruction::SlotIndex;
use crate::value::ContractId;

/// Maximum length of textual metadata strings (names).
pub const MAX_NAME_BYTES: usize = 1024;

/// A persistent single-value slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateVar {
    pub index: SlotIndex,
    pub data_type: DataType,
}

impl StateVar {
    pub fn new(index: SlotIndex, data_type: DataType) -> Self {
        Self { index, data_type }
    }
}

/// A persistent associative slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMap {
    pub index: SlotIndex,
    pub key_type: DataType,
    pub value_type: DataType,
}

impl StateMap {
    pub fn new(index: SlotIndex, key_type: DataType, value_type: DataType) -> Self {
        Self {
            index,
            key_type,
            value_type,
        }
    }
}

/// Client-facing signature of one function. Has no execution effect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionSignature {
    pub name: String,
    pub param_names: Vec<String>,
    pub return_names: Vec<String>,
}

impl FunctionSignature {
    pub fn new(name: &str, param_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            param_names: param_names.iter().map(|s| s.to_string()).collect(),
            return_names: Vec::new(),
        }
    }
}

/// Optional introspection metadata, parallel to the descriptor's lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Textual {
    pub triggers: Vec<FunctionSignature>,
    pub functions: Vec<FunctionSignature>,
    pub state_vars: Vec<String>,
    pub state_maps: Vec<String>,
}

/// A contract descriptor: everything deployment needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub language_id: String,
    pub version: i32,
    pub triggers: Vec<Function>,
    pub functions: Vec<Function>,
    pub state_vars: Vec<StateVar>,
    pub state_maps: Vec<StateMap>,
    pub textual: Option<Textual>,
}

impl Contract {
    /// Encode the descriptor to bytecode.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        let lang = self.language_id.as_bytes();
        let lang_len = lang.len().min(u8::MAX as usize);
        w.u8(lang_len as u8);
        w.raw(&lang[..lang_len]);
        w.i32(self.version);

        for list in [&self.triggers, &self.functions] {
            w.u16(list.len() as u16);
            for f in list {
                f.encode_into(&mut w);
            }
        }

        w.u16(self.state_vars.len() as u16);
        for var in &self.state_vars {
            w.u8(var.index);
            w.u8(var.data_type as u8);
        }

        w.u16(self.state_maps.len() as u16);
        for map in &self.state_maps {
            w.u8(map.index);
            w.u8(map.key_type as u8);
            w.u8(map.value_type as u8);
        }

        match &self.textual {
            None => w.u8(0),
            Some(textual) => {
                w.u8(1);
                encode_textual(&mut w, textual);
            }
        }

        w.into_bytes()
    }

    /// Decode bytecode into a descriptor. The whole input must be consumed.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);

        let at = r.position();
        let lang_len = r.u8()? as usize;
        let language_id = String::from_utf8(r.take(lang_len)?.to_vec())
            .map_err(|_| DecodeError::InvalidUtf8 { at })?;
        let version = r.i32()?;

        let triggers = read_functions(&mut r)?;
        let functions = read_functions(&mut r)?;

        let var_count = r.u16()? as usize;
        let mut state_vars = Vec::with_capacity(var_count.min(r.remaining()));
        for _ in 0..var_count {
            let index = r.u8()?;
            state_vars.push(StateVar::new(index, DataType::try_from(r.u8()?)?));
        }

        let map_count = r.u16()? as usize;
        let mut state_maps = Vec::with_capacity(map_count.min(r.remaining()));
        for _ in 0..map_count {
            let index = r.u8()?;
            let key_type = DataType::try_from(r.u8()?)?;
            let value_type = DataType::try_from(r.u8()?)?;
            state_maps.push(StateMap::new(index, key_type, value_type));
        }

        let textual = match r.u8()? {
            0 => None,
            1 => Some(decode_textual(&mut r)?),
            other => return Err(DecodeError::InvalidFlag(other)),
        };

        r.finish()?;

        Ok(Self {
            language_id,
            version,
            triggers,
            functions,
            state_vars,
            state_maps,
            textual,
        })
    }

    /// Content-derived contract id.
    pub fn id(&self) -> ContractId {
        ContractId::from_bytecode(&self.encode())
    }

    /// Look up a declared state var by index.
    pub fn state_var(&self, index: SlotIndex) -> Option<&StateVar> {
        self.state_vars.iter().find(|v| v.index == index)
    }

    /// Look up a declared state map by index.
    pub fn state_map(&self, index: SlotIndex) -> Option<&StateMap> {
        self.state_maps.iter().find(|m| m.index == index)
    }
}

fn read_functions(r: &mut Reader<'_>) -> Result<Vec<Function>, DecodeError> {
    let count = r.u16()? as usize;
    let mut out = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        out.push(Function::decode_from(r)?);
    }
    Ok(out)
}

fn encode_textual(w: &mut Writer, textual: &Textual) {
    for sigs in [&textual.triggers, &textual.functions] {
        w.u16(sigs.len() as u16);
        for sig in sigs {
            w.text(&sig.name);
            for names in [&sig.param_names, &sig.return_names] {
                w.u8(names.len() as u8);
                for name in names {
                    w.text(name);
                }
            }
        }
    }
    for names in [&textual.state_vars, &textual.state_maps] {
        w.u16(names.len() as u16);
        for name in names {
            w.text(name);
        }
    }
}

fn decode_textual(r: &mut Reader<'_>) -> Result<Textual, DecodeError> {
    let triggers = read_signatures(r)?;
    let functions = read_signatures(r)?;
    let count = r.u16()? as usize;
    let state_vars = read_names(r, count)?;
    let count = r.u16()? as usize;
    let state_maps = read_names(r, count)?;
    Ok(Textual {
        triggers,
        functions,
        state_vars,
        state_maps,
    })
}

fn read_signatures(r: &mut Reader<'_>) -> Result<Vec<FunctionSignature>, DecodeError> {
    let count = r.u16()? as usize;
    let mut sigs = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        let name = r.text(MAX_NAME_BYTES)?;
        let n = r.u8()? as usize;
        let param_names = read_names(r, n)?;
        let n = r.u8()? as usize;
        let return_names = read_names(r, n)?;
        sigs.push(FunctionSignature {
            name,
            param_names,
            return_names,
        });
    }
    Ok(sigs)
}

fn read_names(r: &mut Reader<'_>, count: usize) -> Result<Vec<String>, DecodeError> {
    (0..count).map(|_| r.text(MAX_NAME_BYTES)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionKind;
    use crate::instruction::Instruction;

    fn sample() -> Contract {
        Contract {
            language_id: "ledgervm".to_string(),
            version: 1,
            triggers: vec![Function::trigger(
                0,
                FunctionKind::OnInit,
                vec![],
                vec![
                    Instruction::LoadSigner { dest: 0 },
                    Instruction::CdbvSet { var: 0, value: 0 },
                ],
            )],
            functions: vec![Function::public(
                0,
                vec![DataType::Address],
                vec![Instruction::AssertSigner { account: 0 }],
            )],
            state_vars: vec![StateVar::new(0, DataType::Address)],
            state_maps: vec![StateMap::new(0, DataType::Address, DataType::Boolean)],
            textual: Some(Textual {
                triggers: vec![FunctionSignature::new("init", &[])],
                functions: vec![FunctionSignature::new("check", &["owner"])],
                state_vars: vec!["owner".to_string()],
                state_maps: vec!["flags".to_string()],
            }),
        }
    }

    #[test]
    fn header_layout() {
        let bytes = sample().encode();
        assert_eq!(bytes[0], 8);
        assert_eq!(&bytes[1..9], b"ledgervm");
        assert_eq!(&bytes[9..13], &[0, 0, 0, 1]);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let c = sample();
        assert_eq!(Contract::decode(&c.encode()), Ok(c));
    }

    #[test]
    fn roundtrip_without_textual() {
        let mut c = sample();
        c.textual = None;
        let bytes = c.encode();
        assert_eq!(*bytes.last().unwrap(), 0);
        assert_eq!(Contract::decode(&bytes), Ok(c));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = sample().encode();
        bytes.push(0xAA);
        assert!(matches!(
            Contract::decode(&bytes),
            Err(DecodeError::TrailingBytes { count: 1, .. })
        ));
    }

    #[test]
    fn truncated_bytecode_rejected() {
        let bytes = sample().encode();
        for cut in [0, 5, 13, bytes.len() - 1] {
            assert!(
                Contract::decode(&bytes[..cut]).is_err(),
                "cut at {cut} should fail"
            );
        }
    }

    #[test]
    fn id_depends_on_content() {
        let a = sample();
        let mut b = sample();
        b.version = 2;
        assert_eq!(a.id(), sample().id());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn slot_lookup() {
        let c = sample();
        assert_eq!(c.state_var(0).map(|v| v.data_type), Some(DataType::Address));
        assert!(c.state_var(1).is_none());
        assert_eq!(
            c.state_map(0).map(|m| m.value_type),
            Some(DataType::Boolean)
        );
    }
}
