//! Constant-product automated market maker.
//!
//! Holds reserves of two tokens (A and B) and issues liquidity shares
//! against them. Tokens reach the contract through deposit triggers, which
//! credit a per-account escrow; every function then works on escrow
//! balances only. Prices follow `reserveA * reserveB = k` with a 0.3% fee
//! on the input side.
//!
//! All products and quotients are computed in BigInteger and narrowed to
//! Amount only once a result is final.

use crate::body::Body;
use ledgervm_builder::{BuildError, ContractBuilder, ValidContract};
use ledgervm_common::{
    DataType, DataValue, Function, FunctionId, FunctionKind, FunctionSignature, Reg, SlotIndex,
};

pub const VAR_MAKER: SlotIndex = 0;
pub const VAR_TOKEN_A: SlotIndex = 1;
pub const VAR_TOKEN_B: SlotIndex = 2;
pub const VAR_LIQUIDITY_TOKEN: SlotIndex = 3;
pub const VAR_SWAP_ENABLED: SlotIndex = 4;
pub const VAR_MINIMUM_LIQUIDITY: SlotIndex = 5;
pub const VAR_RESERVE_A: SlotIndex = 6;
pub const VAR_RESERVE_B: SlotIndex = 7;
pub const VAR_TOTAL_SUPPLY: SlotIndex = 8;
pub const VAR_LIQUIDITY_BUDGET: SlotIndex = 9;

/// Escrow maps, `Address -> Amount`.
pub const MAP_ESCROW_A: SlotIndex = 0;
pub const MAP_ESCROW_B: SlotIndex = 1;
pub const MAP_ESCROW_LIQUIDITY: SlotIndex = 2;

pub const SUPERSEDE: FunctionId = 0;
pub const SET_SWAP: FunctionId = 1;
pub const ADD_LIQUIDITY: FunctionId = 2;
pub const REMOVE_LIQUIDITY: FunctionId = 3;
pub const SWAP_TOKEN_FOR_EXACT_BASE_TOKEN: FunctionId = 4;
pub const SWAP_EXACT_TOKEN_FOR_BASE_TOKEN: FunctionId = 5;

/// Share of the input kept by the trader, in thousandths.
pub const FEE_NUMERATOR: i64 = 997;
pub const FEE_DENOMINATOR: i64 = 1000;

/// Build the AMM contract.
pub fn amm_contract() -> Result<ValidContract, Vec<BuildError>> {
    let flow = ["account", "amount"];
    ContractBuilder::new(2)
        .state_var("maker", VAR_MAKER, DataType::Address)
        .state_var("tokenAId", VAR_TOKEN_A, DataType::TokenId)
        .state_var("tokenBId", VAR_TOKEN_B, DataType::TokenId)
        .state_var("liquidityTokenId", VAR_LIQUIDITY_TOKEN, DataType::TokenId)
        .state_var("swapEnabled", VAR_SWAP_ENABLED, DataType::Boolean)
        .state_var("minimumLiquidity", VAR_MINIMUM_LIQUIDITY, DataType::Amount)
        .state_var("reserveA", VAR_RESERVE_A, DataType::Amount)
        .state_var("reserveB", VAR_RESERVE_B, DataType::Amount)
        .state_var("totalLiquiditySupply", VAR_TOTAL_SUPPLY, DataType::Amount)
        .state_var(
            "liquidityBudgetRemaining",
            VAR_LIQUIDITY_BUDGET,
            DataType::Amount,
        )
        .state_map("tokenAEscrow", MAP_ESCROW_A, DataType::Address, DataType::Amount)
        .state_map("tokenBEscrow", MAP_ESCROW_B, DataType::Address, DataType::Amount)
        .state_map(
            "liquidityEscrow",
            MAP_ESCROW_LIQUIDITY,
            DataType::Address,
            DataType::Amount,
        )
        .trigger(
            FunctionSignature::new(
                "init",
                &[
                    "tokenAId",
                    "tokenBId",
                    "liquidityTokenId",
                    "minimumLiquidity",
                ],
            ),
            init(),
        )
        .trigger(
            FunctionSignature::new("depositA", &flow),
            escrow_trigger(1, FunctionKind::OnDeposit { token_var: VAR_TOKEN_A }, MAP_ESCROW_A),
        )
        .trigger(
            FunctionSignature::new("depositB", &flow),
            escrow_trigger(2, FunctionKind::OnDeposit { token_var: VAR_TOKEN_B }, MAP_ESCROW_B),
        )
        .trigger(
            FunctionSignature::new("depositLiquidity", &flow),
            fund_liquidity(),
        )
        .trigger(
            FunctionSignature::new("withdrawA", &flow),
            escrow_trigger(4, FunctionKind::OnWithdraw { token_var: VAR_TOKEN_A }, MAP_ESCROW_A),
        )
        .trigger(
            FunctionSignature::new("withdrawB", &flow),
            escrow_trigger(5, FunctionKind::OnWithdraw { token_var: VAR_TOKEN_B }, MAP_ESCROW_B),
        )
        .trigger(
            FunctionSignature::new("withdrawLiquidity", &flow),
            escrow_trigger(
                6,
                FunctionKind::OnWithdraw {
                    token_var: VAR_LIQUIDITY_TOKEN,
                },
                MAP_ESCROW_LIQUIDITY,
            ),
        )
        .function(FunctionSignature::new("supersede", &["newMaker"]), supersede())
        .function(
            FunctionSignature::new("setSwap", &["amountADesired", "amountBDesired"]),
            set_swap(),
        )
        .function(
            FunctionSignature::new(
                "addLiquidity",
                &[
                    "amountADesired",
                    "amountBDesired",
                    "amountAMin",
                    "amountBMin",
                    "deadline",
                ],
            ),
            add_liquidity(),
        )
        .function(
            FunctionSignature::new(
                "removeLiquidity",
                &["liquidity", "amountAMin", "amountBMin", "deadline"],
            ),
            remove_liquidity(),
        )
        .function(
            FunctionSignature::new(
                "swapTokenForExactBaseToken",
                &["amountOut", "amountInMax", "deadline"],
            ),
            swap_token_for_exact_base_token(),
        )
        .function(
            FunctionSignature::new(
                "swapExactTokenForBaseToken",
                &["amountIn", "amountOutMin", "deadline"],
            ),
            swap_exact_token_for_base_token(),
        )
        .build()
}

fn init() -> Function {
    let mut b = Body::new(4);
    b.set_var(VAR_TOKEN_A, 0);
    b.set_var(VAR_TOKEN_B, 1);
    b.set_var(VAR_LIQUIDITY_TOKEN, 2);
    b.set_var(VAR_MINIMUM_LIQUIDITY, 3);
    let maker = b.signer();
    b.set_var(VAR_MAKER, maker);
    let disabled = b.constant(DataValue::Boolean(false));
    b.set_var(VAR_SWAP_ENABLED, disabled);
    let zero = b.amount(0);
    for var in [
        VAR_RESERVE_A,
        VAR_RESERVE_B,
        VAR_TOTAL_SUPPLY,
        VAR_LIQUIDITY_BUDGET,
    ] {
        b.set_var(var, zero);
    }
    Function::trigger(
        0,
        FunctionKind::OnInit,
        vec![
            DataType::TokenId,
            DataType::TokenId,
            DataType::TokenId,
            DataType::Amount,
        ],
        b.finish(),
    )
}

fn flow_params() -> Vec<DataType> {
    vec![DataType::Address, DataType::Amount]
}

/// Credit (deposit) or debit (withdraw) the account's escrow in `map`.
fn escrow_trigger(id: FunctionId, kind: FunctionKind, map: SlotIndex) -> Function {
    let (account, amount) = (0, 1);
    let mut b = Body::new(2);
    match kind {
        FunctionKind::OnWithdraw { .. } => b.entry_minus(map, account, amount),
        _ => b.entry_add(map, account, amount),
    }
    Function::trigger(id, kind, flow_params(), b.finish())
}

/// Liquidity tokens come only from the maker and fund the share budget.
fn fund_liquidity() -> Function {
    let (account, amount) = (0, 1);
    let mut b = Body::new(2);
    let maker = b.var(VAR_MAKER);
    b.assert_equal(account, maker);
    b.var_add(VAR_LIQUIDITY_BUDGET, amount);
    Function::trigger(
        3,
        FunctionKind::OnDeposit {
            token_var: VAR_LIQUIDITY_TOKEN,
        },
        flow_params(),
        b.finish(),
    )
}

fn supersede() -> Function {
    let mut b = Body::new(1);
    let maker = b.var(VAR_MAKER);
    b.assert_signer(maker);
    b.set_var(VAR_MAKER, 0);
    Function::public(SUPERSEDE, vec![DataType::Address], b.finish())
}

fn require_enabled(b: &mut Body) {
    let enabled = b.var(VAR_SWAP_ENABLED);
    b.assert_true(enabled);
}

/// Open the pool with its first deposit. The first `minimumLiquidity`
/// shares are locked forever.
fn set_swap() -> Function {
    let (a_desired, b_desired) = (0, 1);
    let mut b = Body::new(2);
    let maker = b.var(VAR_MAKER);
    b.assert_caller(maker);
    let enabled = b.var(VAR_SWAP_ENABLED);
    let disabled = b.not(enabled);
    b.assert_true(disabled);
    let zero = b.amount(0);
    b.assert_greater(a_desired, zero);
    b.assert_greater(b_desired, zero);

    let caller = b.caller();
    b.entry_minus(MAP_ESCROW_A, caller, a_desired);
    b.entry_minus(MAP_ESCROW_B, caller, b_desired);

    let big_a = b.to_big(a_desired);
    let big_b = b.to_big(b_desired);
    let product = b.mul(big_a, big_b);
    let root = b.sqrt(product);
    let initial = b.to_amount(root);
    let minimum = b.var(VAR_MINIMUM_LIQUIDITY);
    b.assert_greater(initial, minimum);

    b.var_minus(VAR_LIQUIDITY_BUDGET, initial);
    let minted = b.minus(initial, minimum);
    b.entry_add(MAP_ESCROW_LIQUIDITY, caller, minted);
    b.set_var(VAR_TOTAL_SUPPLY, initial);
    b.set_var(VAR_RESERVE_A, a_desired);
    b.set_var(VAR_RESERVE_B, b_desired);
    let on = b.constant(DataValue::Boolean(true));
    b.set_var(VAR_SWAP_ENABLED, on);

    Function::public(SET_SWAP, vec![DataType::Amount, DataType::Amount], b.finish())
}

/// Add both assets at the current ratio and mint shares for them.
fn add_liquidity() -> Function {
    let (a_desired, b_desired, a_min, b_min, deadline) = (0, 1, 2, 3, 4);
    let mut b = Body::new(5);
    require_enabled(&mut b);
    b.assert_not_expired(deadline);

    let reserve_a = b.var(VAR_RESERVE_A);
    let reserve_b = b.var(VAR_RESERVE_B);
    let total = b.var(VAR_TOTAL_SUPPLY);
    let zero = b.amount(0);
    b.assert_greater(reserve_a, zero);
    b.assert_greater(reserve_b, zero);

    let big_a_desired = b.to_big(a_desired);
    let big_b_desired = b.to_big(b_desired);
    let big_ra = b.to_big(reserve_a);
    let big_rb = b.to_big(reserve_b);
    let big_total = b.to_big(total);

    // If bOptimal fits under bDesired the pair is (aDesired, bOptimal),
    // otherwise (aOptimal, bDesired). The branch is taken arithmetically:
    // pick = clamp(bDesired - bOptimal + 1, 0, 1).
    let b_scaled = b.mul(big_a_desired, big_rb);
    let b_optimal = b.div(b_scaled, big_ra);
    let a_scaled = b.mul(big_b_desired, big_ra);
    let a_optimal = b.div(a_scaled, big_rb);
    let big_zero = b.big(0);
    let big_one = b.big(1);
    let slack = b.minus(big_b_desired, b_optimal);
    let slack = b.add(slack, big_one);
    let pick = b.max(slack, big_zero);
    let pick = b.min(pick, big_one);
    let a_gap = b.minus(big_a_desired, a_optimal);
    let a_gap = b.mul(pick, a_gap);
    let big_amount_a = b.add(a_optimal, a_gap);
    let b_gap = b.minus(b_optimal, big_b_desired);
    let b_gap = b.mul(pick, b_gap);
    let big_amount_b = b.add(big_b_desired, b_gap);
    let amount_a = b.to_amount(big_amount_a);
    let amount_b = b.to_amount(big_amount_b);
    b.assert_at_least(amount_a, a_min);
    b.assert_at_least(amount_b, b_min);

    let share_a = b.mul(big_amount_a, big_total);
    let liquidity_a = b.div(share_a, big_ra);
    let share_b = b.mul(big_amount_b, big_total);
    let liquidity_b = b.div(share_b, big_rb);
    let big_liquidity = b.min(liquidity_a, liquidity_b);
    let liquidity = b.to_amount(big_liquidity);
    b.assert_greater(liquidity, zero);

    let caller = b.caller();
    b.entry_minus(MAP_ESCROW_A, caller, amount_a);
    b.entry_minus(MAP_ESCROW_B, caller, amount_b);
    b.var_minus(VAR_LIQUIDITY_BUDGET, liquidity);
    b.var_add(VAR_RESERVE_A, amount_a);
    b.var_add(VAR_RESERVE_B, amount_b);
    b.var_add(VAR_TOTAL_SUPPLY, liquidity);
    b.entry_add(MAP_ESCROW_LIQUIDITY, caller, liquidity);

    Function::public(
        ADD_LIQUIDITY,
        vec![
            DataType::Amount,
            DataType::Amount,
            DataType::Amount,
            DataType::Amount,
            DataType::Timestamp,
        ],
        b.finish(),
    )
}

/// Burn shares and pay out the proportional part of both reserves.
fn remove_liquidity() -> Function {
    let (liquidity, a_min, b_min, deadline) = (0, 1, 2, 3);
    let mut b = Body::new(4);
    require_enabled(&mut b);
    b.assert_not_expired(deadline);

    let caller = b.caller();
    b.entry_minus(MAP_ESCROW_LIQUIDITY, caller, liquidity);

    let reserve_a = b.var(VAR_RESERVE_A);
    let reserve_b = b.var(VAR_RESERVE_B);
    let total = b.var(VAR_TOTAL_SUPPLY);
    let big_liquidity = b.to_big(liquidity);
    let big_ra = b.to_big(reserve_a);
    let big_rb = b.to_big(reserve_b);
    let big_total = b.to_big(total);

    let share_a = b.mul(big_liquidity, big_ra);
    let big_amount_a = b.div(share_a, big_total);
    let share_b = b.mul(big_liquidity, big_rb);
    let big_amount_b = b.div(share_b, big_total);
    let amount_a = b.to_amount(big_amount_a);
    let amount_b = b.to_amount(big_amount_b);
    b.assert_at_least(amount_a, a_min);
    b.assert_at_least(amount_b, b_min);

    b.entry_add(MAP_ESCROW_A, caller, amount_a);
    b.entry_add(MAP_ESCROW_B, caller, amount_b);
    b.var_minus(VAR_RESERVE_A, amount_a);
    b.var_minus(VAR_RESERVE_B, amount_b);
    b.var_minus(VAR_TOTAL_SUPPLY, liquidity);
    b.var_add(VAR_LIQUIDITY_BUDGET, liquidity);

    Function::public(
        REMOVE_LIQUIDITY,
        vec![
            DataType::Amount,
            DataType::Amount,
            DataType::Amount,
            DataType::Timestamp,
        ],
        b.finish(),
    )
}

/// Check `(rA' * 1000 - amountIn * 3) * (rB' * 1000) >= rA * rB * 1000^2`.
fn assert_invariant(b: &mut Body, big_ra: Reg, big_rb: Reg, big_in: Reg, big_out: Reg) {
    let denominator = b.big(FEE_DENOMINATOR);
    let fee = b.big(FEE_DENOMINATOR - FEE_NUMERATOR);
    let ra_after = b.add(big_ra, big_in);
    let rb_after = b.minus(big_rb, big_out);
    let ra_scaled = b.mul(ra_after, denominator);
    let charged = b.mul(big_in, fee);
    let ra_adjusted = b.minus(ra_scaled, charged);
    let rb_adjusted = b.mul(rb_after, denominator);
    let lhs = b.mul(ra_adjusted, rb_adjusted);
    let k = b.mul(big_ra, big_rb);
    let scale = b.mul(denominator, denominator);
    let rhs = b.mul(k, scale);
    b.assert_at_least(lhs, rhs);
}

/// Move the traded amounts between the caller's escrows and the reserves.
fn settle_swap(b: &mut Body, amount_in: Reg, amount_out: Reg) {
    let caller = b.caller();
    b.entry_minus(MAP_ESCROW_A, caller, amount_in);
    b.entry_add(MAP_ESCROW_B, caller, amount_out);
    b.var_add(VAR_RESERVE_A, amount_in);
    b.var_minus(VAR_RESERVE_B, amount_out);
}

/// Buy exactly `amountOut` of token B, paying at most `amountInMax` of A.
fn swap_token_for_exact_base_token() -> Function {
    let (amount_out, amount_in_max, deadline) = (0, 1, 2);
    let mut b = Body::new(3);
    require_enabled(&mut b);
    b.assert_not_expired(deadline);
    let zero = b.amount(0);
    b.assert_greater(amount_out, zero);

    let reserve_a = b.var(VAR_RESERVE_A);
    let reserve_b = b.var(VAR_RESERVE_B);
    b.assert_greater(reserve_b, amount_out);

    let big_ra = b.to_big(reserve_a);
    let big_rb = b.to_big(reserve_b);
    let big_out = b.to_big(amount_out);
    let denominator = b.big(FEE_DENOMINATOR);
    let numerator = b.big(FEE_NUMERATOR);
    let one = b.big(1);

    let scaled_out = b.mul(big_ra, big_out);
    let dividend = b.mul(scaled_out, denominator);
    let remaining = b.minus(big_rb, big_out);
    let divisor = b.mul(remaining, numerator);
    let quotient = b.div(dividend, divisor);
    let big_in = b.add(quotient, one);
    let amount_in = b.to_amount(big_in);
    b.assert_at_least(amount_in_max, amount_in);

    assert_invariant(&mut b, big_ra, big_rb, big_in, big_out);
    settle_swap(&mut b, amount_in, amount_out);

    Function::public(
        SWAP_TOKEN_FOR_EXACT_BASE_TOKEN,
        vec![DataType::Amount, DataType::Amount, DataType::Timestamp],
        b.finish(),
    )
}

/// Sell exactly `amountIn` of token A for at least `amountOutMin` of B.
fn swap_exact_token_for_base_token() -> Function {
    let (amount_in, amount_out_min, deadline) = (0, 1, 2);
    let mut b = Body::new(3);
    require_enabled(&mut b);
    b.assert_not_expired(deadline);
    let zero = b.amount(0);
    b.assert_greater(amount_in, zero);

    let reserve_a = b.var(VAR_RESERVE_A);
    let reserve_b = b.var(VAR_RESERVE_B);
    let big_ra = b.to_big(reserve_a);
    let big_rb = b.to_big(reserve_b);
    let big_in = b.to_big(amount_in);
    let denominator = b.big(FEE_DENOMINATOR);
    let numerator = b.big(FEE_NUMERATOR);

    let in_after_fee = b.mul(big_in, numerator);
    let dividend = b.mul(in_after_fee, big_rb);
    let scaled_ra = b.mul(big_ra, denominator);
    let divisor = b.add(scaled_ra, in_after_fee);
    let big_out = b.div(dividend, divisor);
    let amount_out = b.to_amount(big_out);
    b.assert_at_least(amount_out, amount_out_min);
    b.assert_greater(amount_out, zero);
    b.assert_greater(reserve_b, amount_out);

    assert_invariant(&mut b, big_ra, big_rb, big_in, big_out);
    settle_swap(&mut b, amount_in, amount_out);

    Function::public(
        SWAP_EXACT_TOKEN_FOR_BASE_TOKEN,
        vec![DataType::Amount, DataType::Amount, DataType::Timestamp],
        b.finish(),
    )
}
