//! modern-auth - passkey ceremonies and an OAuth2 authorization-code server
//!
//! [`ModernAuth`] owns every collaborator; transports call its methods and render the
//! results (JSON bodies, redirect URIs) themselves.

mod config;
mod coordination;
mod oauth2;
mod passkey;
mod storage;
mod userdb;
mod utils;

pub use config::{AuthConfig, ConfigError};

pub use coordination::{
    AssertionResponse, CeremonyResult, CoordinationError, ModernAuth, RegistrationResponse,
};

pub use oauth2::{
    AuthorizationError, AuthorizationErrorType, AuthorizationRequest, AuthorizationResponse,
    AuthorizationService, AuthorizeRequest, Client, CodeChallengeMethod, Grant, OAuth2Config,
    OAuth2Error, RandomTokenHandler, TokenError, TokenErrorType, TokenHandler, TokenRequest,
    TokenResponse, TokenService,
};

pub use passkey::{
    AllowCredential, AttestationPreference, AuthenticatorSelection, CeremonyKind,
    CeremonyOptions, CeremonyVerifier, CosePublicKey, CreationOptions, CredentialOptions, EcCurve,
    PasskeyConfig, PasskeyError, PubKeyCredParam, PublicKeyCredentialUserEntity, RelyingParty,
    RequestOptions, UserVerification, VerifiedAssertion, VerifiedRegistration, decode_cose_key,
    signature_base, verify_signature,
};

pub use storage::{
    CacheData, DataStore, InMemoryKeyValueStore, KeyValueStore, RedisKeyValueStore,
    SqlKeyValueStore, StorageConfig, StorageError, StoreBackend, connect_data_store,
    create_cache_store,
};

pub use userdb::{
    ClientRepository, Credential, CredentialRepository, InMemoryRepository, RepositoryError,
    SqlRepository, Status, User, UserRepository,
};

pub use utils::UtilError;
