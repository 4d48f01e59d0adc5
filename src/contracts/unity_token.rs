use ethers::prelude::*;

// Unity Token sale contract ABI
abigen!(
    UnityToken,
    r#"[
        function buyTokens(address[] recipients, uint256[] amounts) external payable
        function withdraw(uint256 amount) external
        function balanceOf(address account) external view returns (uint256)
        function name() external view returns (string)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        event TokensPurchased(address indexed buyer, uint256 ethAmount, uint256 tokenAmount)
    ]"#
);
