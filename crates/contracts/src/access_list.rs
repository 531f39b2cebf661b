//! Access-list token contract.
//!
//! The issuer mints single-unit tokens and maintains a list of flagged
//! accounts. Whether a transfer is allowed depends on the list policy:
//! a whitelist requires both parties to be flagged, a blacklist requires
//! neither to be.

use crate::body::Body;
use ledgervm_builder::{BuildError, ContractBuilder, ValidContract};
use ledgervm_common::{DataType, Function, FunctionId, FunctionKind, FunctionSignature, SlotIndex};

/// State var holding the account allowed to issue and manage the list.
pub const VAR_ISSUER: SlotIndex = 0;
/// State var holding the deploying account, which may replace the issuer.
pub const VAR_MAKER: SlotIndex = 1;
/// State map `Address -> Boolean` of listed accounts.
pub const MAP_LISTED: SlotIndex = 0;

pub const SUPERSEDE: FunctionId = 0;
pub const ISSUE: FunctionId = 1;
pub const UPDATE_LIST: FunctionId = 2;
pub const SEND: FunctionId = 3;

/// How the listed flag gates transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListPolicy {
    /// Only listed accounts may send and receive.
    Whitelist,
    /// Listed accounts may neither send nor receive.
    Blacklist,
}

/// Build the access-list contract for `policy`.
pub fn access_list_contract(policy: ListPolicy) -> Result<ValidContract, Vec<BuildError>> {
    ContractBuilder::new(1)
        .state_var("issuer", VAR_ISSUER, DataType::Address)
        .state_var("maker", VAR_MAKER, DataType::Address)
        .state_map("listed", MAP_LISTED, DataType::Address, DataType::Boolean)
        .trigger(FunctionSignature::new("init", &[]), init())
        .function(
            FunctionSignature::new("supersede", &["newIssuer"]),
            supersede(),
        )
        .function(
            FunctionSignature::new("issue", &["tokenDescription"]),
            issue(),
        )
        .function(
            FunctionSignature::new("updateList", &["account", "flag"]),
            update_list(),
        )
        .function(
            FunctionSignature::new("send", &["recipient", "tokenIndex"]),
            send(policy),
        )
        .build()
}

pub fn whitelist_contract() -> Result<ValidContract, Vec<BuildError>> {
    access_list_contract(ListPolicy::Whitelist)
}

pub fn blacklist_contract() -> Result<ValidContract, Vec<BuildError>> {
    access_list_contract(ListPolicy::Blacklist)
}

fn init() -> Function {
    let mut b = Body::new(0);
    let signer = b.signer();
    b.set_var(VAR_ISSUER, signer);
    b.set_var(VAR_MAKER, signer);
    Function::trigger(0, FunctionKind::OnInit, vec![], b.finish())
}

fn supersede() -> Function {
    let mut b = Body::new(1);
    let maker = b.var(VAR_MAKER);
    b.assert_signer(maker);
    b.set_var(VAR_ISSUER, 0);
    Function::public(SUPERSEDE, vec![DataType::Address], b.finish())
}

/// Mint a fresh single-unit token to the issuer.
fn issue() -> Function {
    let mut b = Body::new(1);
    let issuer = b.var(VAR_ISSUER);
    b.assert_caller(issuer);
    let one = b.amount(1);
    b.new_token(one, one, 0);
    let token = b.last_token();
    b.deposit(token, one, issuer);
    Function::public(ISSUE, vec![DataType::ShortText], b.finish())
}

fn update_list() -> Function {
    let mut b = Body::new(2);
    let issuer = b.var(VAR_ISSUER);
    b.assert_caller(issuer);
    b.set_entry(MAP_LISTED, 0, 1);
    Function::public(
        UPDATE_LIST,
        vec![DataType::Address, DataType::Boolean],
        b.finish(),
    )
}

/// Move one unit of a token from the caller to the recipient, if the list
/// permits both.
fn send(policy: ListPolicy) -> Function {
    let (recipient, token) = (0, 1);
    let mut b = Body::new(2);
    let caller = b.caller();
    let caller_listed = b.map_or_default(MAP_LISTED, caller);
    let recipient_listed = b.map_or_default(MAP_LISTED, recipient);
    let (caller_ok, recipient_ok) = match policy {
        ListPolicy::Whitelist => (caller_listed, recipient_listed),
        ListPolicy::Blacklist => (b.not(caller_listed), b.not(recipient_listed)),
    };
    b.assert_permitted(caller_ok);
    b.assert_permitted(recipient_ok);
    let one = b.amount(1);
    b.transfer(caller, token, one, recipient);
    Function::public(
        SEND,
        vec![DataType::Address, DataType::Int32],
        b.finish(),
    )
}
