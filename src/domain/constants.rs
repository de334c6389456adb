//! Centralized constants for DER tags, OIDs and document field names.
//! Keep this intentionally small; only broadly reused literals should live here.

use der::asn1::ObjectIdentifier;

// === ASN.1 DER tags ===

/// ASN.1 INTEGER tag
pub const ASN1_INTEGER_TAG: u8 = 0x02;

/// ASN.1 OCTET STRING tag
pub const ASN1_OCTET_STRING_TAG: u8 = 0x04;

/// ASN.1 NULL value (tag + length)
pub const ASN1_NULL: &[u8] = &[0x05, 0x00];

/// ASN.1 OBJECT IDENTIFIER tag
pub const ASN1_OID_TAG: u8 = 0x06;

/// ASN.1 SEQUENCE tag
pub const ASN1_SEQUENCE_TAG: u8 = 0x30;

/// ASN.1 SET tag
pub const ASN1_SET_TAG: u8 = 0x31;

/// Context-specific constructed tag [0]. EXPLICIT around `SignedData` in
/// `ContentInfo`, IMPLICIT for `certificates` and `signedAttrs`.
pub const ASN1_CONTEXT_0_TAG: u8 = 0xA0;

// === CMS versions ===

/// `SignedData` version. Must be 3 because eContentType is not id-data.
pub const SIGNED_DATA_VERSION: u8 = 3;

/// `SignerInfo` version. 1 because sid is issuerAndSerialNumber.
pub const SIGNER_INFO_VERSION: u8 = 1;

// === PKCS#7 / CMS content types ===

/// id-signedData (1.2.840.113549.1.7.2)
pub const OID_SIGNED_DATA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// id-digestedData (1.2.840.113549.1.7.5)
pub const OID_DIGESTED_DATA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.5");

// === PKCS#9 / ESS attribute types ===

/// PKCS#9 contentType (1.2.840.113549.1.9.3)
pub const OID_CONTENT_TYPE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3");

/// PKCS#9 messageDigest (1.2.840.113549.1.9.4)
pub const OID_MESSAGE_DIGEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");

/// PKCS#9 signingTime (1.2.840.113549.1.9.5)
pub const OID_SIGNING_TIME: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.5");

/// id-aa-signingCertificateV2 (1.2.840.113549.1.9.16.2.47)
pub const OID_SIGNING_CERTIFICATE_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.47");

// === Algorithms ===

/// id-sha256 (2.16.840.1.101.3.4.2.1)
pub const OID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

/// sha256WithRSAEncryption (1.2.840.113549.1.1.11)
pub const OID_SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

/// rsaEncryption (1.2.840.113549.1.1.1)
pub const OID_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

// === Signed document shape ===

/// Key of the document array inside a batch envelope.
pub const DOCUMENTS_KEY: &str = "documents";

/// Key under which signatures are merged into a document.
pub const SIGNATURES_KEY: &str = "signatures";

/// Issuer signer role.
pub const ISSUER_SIGNATURE_TYPE: &str = "I";
