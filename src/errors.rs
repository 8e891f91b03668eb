// Error types and error handling module
// This file defines the router error taxonomy with the stable codes
// clients match on, and the failure envelope returned by route resolution
//
// Numan Thabit 2025 Nov

use crate::networks::ChainId;
use crate::processors::ProcessorKind;
use crate::router::routes::SuggestedRoutes;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    // balance and selection
    #[error("not enough token balance, token: {symbol}, chainId: {chain_id}")]
    NotEnoughTokenBalance { symbol: String, chain_id: ChainId },
    #[error("not enough native balance, token: {symbol}, chainId: {chain_id}")]
    NotEnoughNativeBalance { symbol: String, chain_id: ChainId },
    #[error("native token not found")]
    NativeTokenNotFound,
    #[error("token not found")]
    TokenNotFound,
    #[error("no best route found")]
    NoBestRouteFound,
    #[error("cannot check balance")]
    CannotCheckBalance,
    #[error("bonder fee greater than estimated received, a higher amount is needed to cover fees")]
    LowAmountInForHopBridge,
    #[error("custom fee mode cannot be set this way")]
    CustomFeeModeCannotBeSetThisWay,
    #[error("only custom fee mode can be set this way")]
    OnlyCustomFeeModeCanBeSetThisWay,
    #[error("cannot customize params if no route")]
    CannotCustomizeIfNoRoute,
    #[error("cannot find path for provided identity")]
    CannotFindPathForProvidedIdentity,
    #[error("path not supported for provided chain")]
    PathNotSupportedForProvidedChain,
    #[error("path not supported between provided chains")]
    PathNotSupportedBetweenProvidedChains,
    #[error("path not available for provided parameters")]
    PathNotAvailableForProvidedParameters,

    // request validation
    #[error("username and public key are required for ENSRegister")]
    EnsRegisterRequiresUsernameAndPubKey,
    #[error("only STT is supported for ENSRegister on testnet")]
    EnsRegisterTestnetSttOnly,
    #[error("only SNT is supported for ENSRegister on mainnet")]
    EnsRegisterMainnetSntOnly,
    #[error("username is required for ENSRelease")]
    EnsReleaseRequiresUsername,
    #[error("username and public key are required for ENSSetPubKey")]
    EnsSetPubKeyRequiresUsernameAndPubKey,
    #[error("packID is required for StickersBuy")]
    StickersBuyRequiresPackId,
    #[error("toTokenID is required for Swap")]
    SwapRequiresToTokenId,
    #[error("tokenID and toTokenID must be different")]
    SwapTokenIdMustBeDifferent,
    #[error("only one of amountIn or amountOut can be set")]
    SwapAmountInAmountOutMustBeExclusive,
    #[error("locked amount is not supported for the selected network")]
    LockedAmountNotSupportedForNetwork,
    #[error("locked amount exceeds the total amount to send")]
    LockedAmountExceedsTotalSendAmount,
    #[error("locked amount is less than the total amount to send, but all networks are locked")]
    LockedAmountLessThanSendAmountAllNetworks,
    #[error("disabled chain found among locked networks")]
    DisabledChainFoundAmongLockedNetworks,
    #[error("a valid username, ending in '.eth', is required for ENSSetPubKey")]
    EnsSetPubKeyInvalidUsername,
    #[error("all supported chains are excluded, routing impossible")]
    LockedAmountExcludesAllSupported,
    #[error("no community parameters provided")]
    NoCommunityParametersProvided,
    #[error("from chain not provided")]
    NoFromChainProvided,
    #[error("to chain not provided")]
    NoToChainProvided,
    #[error("from and to chain IDs must be the same")]
    FromAndToChainMustBeTheSame,

    // community request validation
    #[error("name is not set")]
    NoNameSet,
    #[error("symbol is not set")]
    NoSymbolSet,
    #[error("wrong supply value: {0}")]
    WrongSupplyValue(String),
    #[error("wallet addresses list is empty")]
    WalletAddressesEmpty,
    #[error("amount is required")]
    NoCommunityAmount,
    #[error("amount must be positive")]
    CommunityAmountMustBePositive,
    #[error("community id is required for community related transfers")]
    NoCommunityIdProvided,
    #[error("signer pub key is required")]
    NoCommunitySignerPubKey,
    #[error("signature is required")]
    NoCommunityTokenDeploymentSignature,
    #[error("owner token parameters are required")]
    NoCommunityOwnerTokenParameters,
    #[error("master token parameters are required")]
    NoCommunityMasterTokenParameters,
    #[error("deployment parameters are required")]
    NoCommunityDeploymentParameters,
    #[error("transfer details are required")]
    NoCommunityTransferDetails,
    #[error("contract address is required")]
    NoCommunityContractAddress,
    #[error("token list is empty")]
    CommunityTokenIdsListEmpty,
    #[error("signer pub key can be set only with one transfer detail")]
    SetSignerPubKeyWithMultipleTransferDetails,

    // custom tx params
    #[error("maxFeesPerGas is required")]
    MaxFeesPerGasRequired,
    #[error("priorityFee is required")]
    PriorityFeeRequired,

    // fees
    #[error("custom fee mode is not available in suggested fees")]
    CustomFeeModeNotAvailableInSuggestedFees,
    #[error("EIP-1559 is not supported on this chain")]
    Eip1559IncompatibleChain,
    #[error("invalid reward data")]
    InvalidRewardData,

    /// Strategy-specific failure carrying the strategy's own code.
    #[error("{details}")]
    Processor { code: String, details: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("resolution cancelled")]
    Cancelled,
}

impl RouterError {
    pub fn code(&self) -> &str {
        use RouterError::*;
        match self {
            NotEnoughTokenBalance { .. } => "WR-001",
            NotEnoughNativeBalance { .. } => "WR-002",
            NativeTokenNotFound => "WR-003",
            TokenNotFound => "WR-004",
            NoBestRouteFound => "WR-005",
            CannotCheckBalance => "WR-006",
            LowAmountInForHopBridge => "WR-007",
            CustomFeeModeCannotBeSetThisWay => "WR-009",
            OnlyCustomFeeModeCanBeSetThisWay => "WR-010",
            CannotCustomizeIfNoRoute => "WR-013",
            CannotFindPathForProvidedIdentity => "WR-014",
            PathNotSupportedForProvidedChain => "WR-015",
            PathNotSupportedBetweenProvidedChains => "WR-016",
            PathNotAvailableForProvidedParameters => "WR-017",

            EnsRegisterRequiresUsernameAndPubKey => "WRR-001",
            EnsRegisterTestnetSttOnly => "WRR-002",
            EnsRegisterMainnetSntOnly => "WRR-003",
            EnsReleaseRequiresUsername => "WRR-004",
            EnsSetPubKeyRequiresUsernameAndPubKey => "WRR-005",
            StickersBuyRequiresPackId => "WRR-006",
            SwapRequiresToTokenId => "WRR-007",
            SwapTokenIdMustBeDifferent => "WRR-008",
            SwapAmountInAmountOutMustBeExclusive => "WRR-009",
            LockedAmountNotSupportedForNetwork => "WRR-012",
            LockedAmountExceedsTotalSendAmount => "WRR-014",
            LockedAmountLessThanSendAmountAllNetworks => "WRR-015",
            DisabledChainFoundAmongLockedNetworks => "WRR-016",
            EnsSetPubKeyInvalidUsername => "WRR-017",
            LockedAmountExcludesAllSupported => "WRR-018",
            NoCommunityParametersProvided => "WRR-020",
            NoFromChainProvided => "WRR-021",
            NoToChainProvided => "WRR-022",
            FromAndToChainMustBeTheSame => "WRR-023",

            NoNameSet => "WRRC-001",
            NoSymbolSet => "WRRC-002",
            WrongSupplyValue(_) => "WRRC-003",
            WalletAddressesEmpty => "WRRC-004",
            NoCommunityAmount => "WRRC-005",
            CommunityAmountMustBePositive => "WRRC-006",
            NoCommunityIdProvided => "WRRC-007",
            NoCommunitySignerPubKey => "WRRC-008",
            NoCommunityTokenDeploymentSignature => "WRRC-009",
            NoCommunityOwnerTokenParameters => "WRRC-010",
            NoCommunityMasterTokenParameters => "WRRC-011",
            NoCommunityDeploymentParameters => "WRRC-012",
            NoCommunityTransferDetails => "WRRC-013",
            NoCommunityContractAddress => "WRRC-014",
            CommunityTokenIdsListEmpty => "WRRC-015",
            SetSignerPubKeyWithMultipleTransferDetails => "WRRC-017",

            MaxFeesPerGasRequired => "WRC-001",
            PriorityFeeRequired => "WRC-002",

            CustomFeeModeNotAvailableInSuggestedFees => "WRF-001",
            Eip1559IncompatibleChain => "WRF-002",
            InvalidRewardData => "WRF-003",

            Processor { code, .. } => code,
            Transport(_) => "WRT-001",
            Provider(_) => "WRT-002",
            Cancelled => "WRT-003",
        }
    }

    /// Strategy-specific errors take precedence when reporting why no route exists.
    pub fn is_custom(&self) -> bool {
        matches!(self, RouterError::Processor { .. })
    }

    pub fn processor(code: impl Into<String>, details: impl Into<String>) -> Self {
        RouterError::Processor {
            code: code.into(),
            details: details.into(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            details: self.to_string(),
        }
    }
}

/// Wire shape of an error as seen by API clients and event subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub details: String,
}

/// One execution strategy failing to price one candidate leg.
#[derive(Debug, Clone)]
pub struct ProcessorError {
    pub processor: ProcessorKind,
    pub error: RouterError,
}

/// Resolution failure. `routes` holds whatever was computed before the
/// failure: the candidates, and for balance errors the fallback route.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ResolveFailure {
    pub error: RouterError,
    pub routes: Option<Box<SuggestedRoutes>>,
}

impl ResolveFailure {
    pub fn with_routes(error: RouterError, routes: SuggestedRoutes) -> Self {
        Self {
            error,
            routes: Some(Box::new(routes)),
        }
    }
}

impl From<RouterError> for ResolveFailure {
    fn from(error: RouterError) -> Self {
        Self {
            error,
            routes: None,
        }
    }
}
