//! ABI binding for the on-chain `CropToken` registry.

use ethers::contract::abigen;

abigen!(
    CropToken,
    r#"[
        function nextId() external view returns (uint256)
        function crops(uint256) external view returns (uint256 id, string metadata, address owner)
        function registeredUsers(address) external view returns (bool)
        function registerUser() external
        function createCrop(string metadata) external
        function authenticate(uint256 id, address owner) external view returns (bool)
        function transferCrop(uint256 id, address to) external
        function getCrop(uint256 id) external view returns (uint256, string, address)
        event CropCreated(uint256 id, string metadata, address owner)
        event CropTransferred(uint256 id, address from, address to)
        event UserRegistered(address user)
    ]"#
);
