/*
 * Responsibility
 * - operation ごとに要求 permission を宣言して route に掛ける
 */
pub mod permission;

pub use permission::guard;
