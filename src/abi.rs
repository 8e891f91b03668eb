// Minimal ABI encoding for the token and oracle calls the router makes
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use alloy_primitives::{Address, Bytes, U256};

pub const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
pub const APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
pub const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
pub const ALLOWANCE: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];
pub const ERC1155_BALANCE_OF: [u8; 4] = [0x00, 0xfd, 0xd5, 0x8e];
pub const GET_L1_FEE: [u8; 4] = [0x49, 0x94, 0x8e, 0x0e];

pub fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

pub fn uint_word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// Selector followed by static 32-byte arguments.
pub fn encode_call(selector: [u8; 4], words: &[[u8; 32]]) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32 * words.len());
    data.extend_from_slice(&selector);
    for word in words {
        data.extend_from_slice(word);
    }
    data.into()
}

pub fn transfer(to: Address, amount: U256) -> Bytes {
    encode_call(TRANSFER, &[address_word(to), uint_word(amount)])
}

pub fn approve(spender: Address, amount: U256) -> Bytes {
    encode_call(APPROVE, &[address_word(spender), uint_word(amount)])
}

pub fn balance_of(owner: Address) -> Bytes {
    encode_call(BALANCE_OF, &[address_word(owner)])
}

pub fn allowance(owner: Address, spender: Address) -> Bytes {
    encode_call(ALLOWANCE, &[address_word(owner), address_word(spender)])
}

pub fn erc1155_balance_of(owner: Address, id: U256) -> Bytes {
    encode_call(ERC1155_BALANCE_OF, &[address_word(owner), uint_word(id)])
}

/// `getL1Fee(bytes)`: head offset, length, then the right-padded payload.
pub fn get_l1_fee(tx_data: &[u8]) -> Bytes {
    let mut data = Vec::with_capacity(4 + 64 + tx_data.len() + 32);
    data.extend_from_slice(&GET_L1_FEE);
    data.extend_from_slice(&uint_word(U256::from(32u64)));
    data.extend_from_slice(&uint_word(U256::from(tx_data.len())));
    data.extend_from_slice(tx_data);
    let padding = (32 - tx_data.len() % 32) % 32;
    data.extend(std::iter::repeat(0u8).take(padding));
    data.into()
}

/// First return word of an `eth_call` as an unsigned integer.
pub fn decode_uint(output: &[u8]) -> Result<U256, RouterError> {
    if output.len() < 32 {
        return Err(RouterError::Provider(format!(
            "call returned {} bytes, expected a 32-byte word",
            output.len()
        )));
    }
    Ok(U256::from_be_slice(&output[..32]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_calldata_layout() {
        let to = Address::with_last_byte(0xaa);
        let data = transfer(to, U256::from(5u64));
        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &TRANSFER);
        assert_eq!(data[35], 0xaa);
        assert_eq!(data[67], 5);
    }

    #[test]
    fn dynamic_bytes_are_padded() {
        let data = get_l1_fee(&[1, 2, 3]);
        assert_eq!(data.len(), 4 + 32 + 32 + 32);
        assert_eq!(data[4 + 31], 32);
        assert_eq!(data[4 + 63], 3);
        assert_eq!(&data[68..71], &[1, 2, 3]);

        assert_eq!(get_l1_fee(&[0u8; 32]).len(), 4 + 96);
    }

    #[test]
    fn decodes_first_word() {
        let word = uint_word(U256::from(1234u64));
        assert_eq!(decode_uint(&word).unwrap(), U256::from(1234u64));
        assert!(matches!(decode_uint(&[0u8; 4]), Err(RouterError::Provider(_))));
    }
}
