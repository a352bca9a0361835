//! ALC enumerants shared by the native binding, the negotiation logic and the mocks.

pub const ALC_FALSE: i32 = 0;
pub const ALC_TRUE: i32 = 1;

// Context attributes
pub const ALC_FREQUENCY: i32 = 0x1007;
pub const ALC_REFRESH: i32 = 0x1008;
pub const ALC_SYNC: i32 = 0x1009;
pub const ALC_MONO_SOURCES: i32 = 0x1010;
pub const ALC_STEREO_SOURCES: i32 = 0x1011;

// Error codes
pub const ALC_NO_ERROR: i32 = 0;
pub const ALC_INVALID_DEVICE: i32 = 0xA001;
pub const ALC_INVALID_CONTEXT: i32 = 0xA002;
pub const ALC_INVALID_ENUM: i32 = 0xA003;
pub const ALC_INVALID_VALUE: i32 = 0xA004;
pub const ALC_OUT_OF_MEMORY: i32 = 0xA005;

// String queries
pub const ALC_DEFAULT_DEVICE_SPECIFIER: i32 = 0x1004;
pub const ALC_DEVICE_SPECIFIER: i32 = 0x1005;
pub const ALC_EXTENSIONS: i32 = 0x1006;
pub const ALC_DEFAULT_ALL_DEVICES_SPECIFIER: i32 = 0x1012;
pub const ALC_ALL_DEVICES_SPECIFIER: i32 = 0x1013;

// Integer queries
pub const ALC_MAJOR_VERSION: i32 = 0x1000;
pub const ALC_MINOR_VERSION: i32 = 0x1001;

// ALC_EXT_EFX
pub const ALC_MAX_AUXILIARY_SENDS: i32 = 0x20003;

pub const EXT_EFX: &str = "ALC_EXT_EFX";
pub const EXT_ENUMERATION: &str = "ALC_ENUMERATION_EXT";
pub const EXT_ENUMERATE_ALL: &str = "ALC_ENUMERATE_ALL_EXT";
