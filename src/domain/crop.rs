use ethers::types::Address;

pub type CropId = u64;

/// A crop provenance token as held by the ledger contract.
///
/// The contract never deletes tokens; a lookup for an id that was never
/// minted returns an empty record whose owner is the zero address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropToken {
    pub id: CropId,
    pub metadata: String,
    pub owner: Address,
}

impl CropToken {
    pub fn exists(&self) -> bool {
        !self.owner.is_zero()
    }

    pub fn is_owned_by(&self, address: Address) -> bool {
        self.exists() && self.owner == address
    }
}
