//! Bindings of the contracts the relayer talks to.
#![allow(missing_docs)]

use ethers::contract::abigen;

abigen!(
    TokenBridge,
    r#"[
        function completeTransfer(bytes encodedVm) external
        function wrappedAsset(uint16 tokenChainId, bytes32 tokenAddress) external view returns (address)
        function isTransferCompleted(bytes32 hash) external view returns (bool)
    ]"#,
);

abigen!(
    FeeRegistry,
    r#"[
        function getFee(address token) external view returns (uint256)
    ]"#,
);

abigen!(
    IERC20,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function decimals() external view returns (uint8)
    ]"#,
);

abigen!(
    XcmRouterFactory,
    r#"[
        struct XcmInstructions { bytes dest; bytes weight; }
        function deployXcmRouter(address fees, XcmInstructions inst) external returns (address)
        function deployXcmRouterAndRoute(address fees, XcmInstructions inst, address token) external returns (address)
    ]"#,
);

abigen!(
    WormholeRouterFactory,
    r#"[
        struct WormholeInstructions { uint16 recipientChain; bytes32 recipient; uint32 nonce; uint256 arbiterFee; }
        function deployWormholeRouter(address fees, WormholeInstructions inst, address tokenBridgeAddress) external returns (address)
        function deployWormholeRouterAndRoute(address fees, WormholeInstructions inst, address tokenBridgeAddress, address token) external returns (address)
    ]"#,
);
