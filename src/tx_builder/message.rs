//! Message compilation and size checks
//!
//! Mint transactions always compile to v0 against the lookup table.
//! Initialize and refund prefer a legacy message and fall back to v0 when
//! the legacy encoding does not fit in one packet.

use crate::tx_builder::errors::AssemblyError;
use serde::Serialize;
use solana_sdk::{
    address_lookup_table::{state::AddressLookupTable, AddressLookupTableAccount},
    hash::Hash,
    instruction::Instruction,
    message::{v0, Message, MessageHeader, VersionedMessage},
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Legacy,
    V0,
}

/// Decode a lookup table account fetched from the ledger
pub fn decode_lookup_table(
    address: Pubkey,
    data: &[u8],
) -> Result<AddressLookupTableAccount, AssemblyError> {
    let table = AddressLookupTable::deserialize(data)
        .map_err(|e| AssemblyError::LookupTable(format!("{}: {}", address, e)))?;
    Ok(AddressLookupTableAccount {
        key: address,
        addresses: table.addresses.to_vec(),
    })
}

pub fn message_header(message: &VersionedMessage) -> &MessageHeader {
    match message {
        VersionedMessage::Legacy(m) => &m.header,
        VersionedMessage::V0(m) => &m.header,
    }
}

/// Accounts that must sign the message, fee payer first
pub fn required_signers(message: &VersionedMessage) -> &[Pubkey] {
    let count = message_header(message).num_required_signatures as usize;
    let keys = message.static_account_keys();
    &keys[..count.min(keys.len())]
}

pub fn message_format(message: &VersionedMessage) -> MessageFormat {
    match message {
        VersionedMessage::Legacy(_) => MessageFormat::Legacy,
        VersionedMessage::V0(_) => MessageFormat::V0,
    }
}

/// Wrap a message with placeholder signatures, ready for simulation
pub fn unsigned_transaction(message: VersionedMessage) -> VersionedTransaction {
    let signers = message_header(&message).num_required_signatures as usize;
    VersionedTransaction {
        signatures: vec![Signature::default(); signers],
        message,
    }
}

/// Wire size of the transaction including signatures
pub fn serialized_size(transaction: &VersionedTransaction) -> Result<usize, AssemblyError> {
    bincode::serialized_size(transaction)
        .map(|size| size as usize)
        .map_err(|e| AssemblyError::MessageCompile(e.to_string()))
}

fn ensure_fits(transaction: &VersionedTransaction) -> Result<usize, AssemblyError> {
    let size = serialized_size(transaction)?;
    if size > PACKET_DATA_SIZE {
        return Err(AssemblyError::TransactionTooLarge {
            size,
            max: PACKET_DATA_SIZE,
        });
    }
    Ok(size)
}

pub fn compile_legacy(payer: &Pubkey, instructions: &[Instruction], blockhash: Hash) -> VersionedMessage {
    VersionedMessage::Legacy(Message::new_with_blockhash(instructions, Some(payer), &blockhash))
}

pub fn compile_v0(
    payer: &Pubkey,
    instructions: &[Instruction],
    lookup_tables: &[AddressLookupTableAccount],
    blockhash: Hash,
) -> Result<VersionedMessage, AssemblyError> {
    v0::Message::try_compile(payer, instructions, lookup_tables, blockhash)
        .map(VersionedMessage::V0)
        .map_err(|e| AssemblyError::MessageCompile(e.to_string()))
}

/// Compile in the requested format and reject anything over the packet limit
pub fn build_transaction(
    format: MessageFormat,
    payer: &Pubkey,
    instructions: &[Instruction],
    lookup_table: Option<&AddressLookupTableAccount>,
    blockhash: Hash,
) -> Result<VersionedTransaction, AssemblyError> {
    let message = match format {
        MessageFormat::Legacy => compile_legacy(payer, instructions, blockhash),
        MessageFormat::V0 => {
            let tables: Vec<AddressLookupTableAccount> = lookup_table.cloned().into_iter().collect();
            compile_v0(payer, instructions, &tables, blockhash)?
        }
    };
    let transaction = unsigned_transaction(message);
    ensure_fits(&transaction)?;
    Ok(transaction)
}

/// Legacy when it fits in one packet, otherwise v0 with the lookup table
pub fn build_transaction_auto(
    payer: &Pubkey,
    instructions: &[Instruction],
    lookup_table: Option<&AddressLookupTableAccount>,
    blockhash: Hash,
) -> Result<VersionedTransaction, AssemblyError> {
    match build_transaction(MessageFormat::Legacy, payer, instructions, None, blockhash) {
        Ok(transaction) => Ok(transaction),
        Err(AssemblyError::TransactionTooLarge { .. }) if lookup_table.is_some() => {
            build_transaction(MessageFormat::V0, payer, instructions, lookup_table, blockhash)
        }
        Err(e) => Err(e),
    }
}
