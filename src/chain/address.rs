use ethers::types::Address;
use ethers::utils::to_checksum;

/// Parse a 20-byte hex address, with or without the `0x` prefix.
///
/// All-lowercase and all-uppercase input is accepted as is. Mixed-case
/// input must carry a valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Option<Address> {
    let hex = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let address: Address = hex.parse().ok()?;

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address, None)[2..] != *hex {
        return None;
    }

    Some(address)
}

/// EIP-55 checksummed rendering, `0x`-prefixed.
pub fn checksummed(address: &Address) -> String {
    to_checksum(address, None)
}
