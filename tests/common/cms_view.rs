//! Decoded view of a detached CMS `SignedData` for assertions.

use std::time::SystemTime;

use base64::Engine as _;
use der::asn1::{GeneralizedTime, ObjectIdentifier, UtcTime};
use der::Decode;

use super::der_reader::{children, read_single, Tlv};

/// One signed attribute: type OID plus the single encoded value.
#[derive(Debug, Clone)]
pub struct AttributeView {
    pub oid: ObjectIdentifier,
    pub value: Vec<u8>,
    pub value_count: usize,
}

/// Fields of a `ContentInfo { SignedData }` with a single signer.
#[derive(Debug, Clone)]
pub struct CmsView {
    pub outer_content_type: ObjectIdentifier,
    pub signed_data_version: u8,
    pub digest_algorithms: Vec<ObjectIdentifier>,
    pub econtent_type: ObjectIdentifier,
    pub has_econtent: bool,
    pub certificates: Vec<Vec<u8>>,
    pub signer_info_count: usize,
    pub signer_info_version: u8,
    pub sid_issuer: Vec<u8>,
    pub sid_serial: Vec<u8>,
    pub signer_digest_algorithm: ObjectIdentifier,
    /// `signedAttrs` as embedded, `[0] IMPLICIT` tag included.
    pub signed_attrs_embedded: Vec<u8>,
    pub attributes: Vec<AttributeView>,
    pub signature_algorithm: ObjectIdentifier,
    pub signature_algorithm_params: Option<Vec<u8>>,
    pub signature: Vec<u8>,
    pub has_unsigned_attrs: bool,
}

fn oid(tlv: &Tlv<'_>) -> ObjectIdentifier {
    assert_eq!(tlv.tag, 0x06, "expected OBJECT IDENTIFIER");
    ObjectIdentifier::from_bytes(tlv.value).unwrap()
}

fn small_int(tlv: &Tlv<'_>) -> u8 {
    assert_eq!(tlv.tag, 0x02, "expected INTEGER");
    assert_eq!(tlv.value.len(), 1);
    tlv.value[0]
}

impl CmsView {
    pub fn from_base64(signature: &str) -> Self {
        let der = base64::engine::general_purpose::STANDARD
            .decode(signature)
            .expect("signature is standard base64");
        Self::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> Self {
        let content_info = read_single(der);
        assert_eq!(content_info.tag, 0x30);
        let ci = children(content_info.value);
        assert_eq!(ci.len(), 2);
        let outer_content_type = oid(&ci[0]);
        assert_eq!(ci[1].tag, 0xA0, "content is [0] EXPLICIT");

        let signed_data = read_single(ci[1].value);
        assert_eq!(signed_data.tag, 0x30);
        let sd = children(signed_data.value);
        assert_eq!(sd.len(), 5, "version, digestAlgorithms, encap, certificates, signerInfos");

        let signed_data_version = small_int(&sd[0]);
        assert_eq!(sd[1].tag, 0x31);
        let digest_algorithms = children(sd[1].value)
            .iter()
            .map(|alg| oid(&children(alg.value)[0]))
            .collect();

        let encap = children(sd[2].value);
        let econtent_type = oid(&encap[0]);
        let has_econtent = encap.len() > 1;

        assert_eq!(sd[3].tag, 0xA0, "certificates [0] IMPLICIT");
        let certificates = children(sd[3].value)
            .iter()
            .map(|c| c.raw.to_vec())
            .collect();

        assert_eq!(sd[4].tag, 0x31);
        let signer_infos = children(sd[4].value);
        let si = children(signer_infos[0].value);

        let signer_info_version = small_int(&si[0]);
        let sid = children(si[1].value);
        let signer_digest_algorithm = oid(&children(si[2].value)[0]);
        assert_eq!(si[3].tag, 0xA0, "signedAttrs [0] IMPLICIT");
        let attributes = children(si[3].value)
            .iter()
            .map(|attr| {
                let parts = children(attr.value);
                assert_eq!(parts[1].tag, 0x31, "attrValues is a SET");
                let values = children(parts[1].value);
                AttributeView {
                    oid: oid(&parts[0]),
                    value: values[0].raw.to_vec(),
                    value_count: values.len(),
                }
            })
            .collect();
        let sig_alg = children(si[4].value);
        assert_eq!(si[5].tag, 0x04, "signature is an OCTET STRING");

        Self {
            outer_content_type,
            signed_data_version,
            digest_algorithms,
            econtent_type,
            has_econtent,
            certificates,
            signer_info_count: signer_infos.len(),
            signer_info_version,
            sid_issuer: sid[0].raw.to_vec(),
            sid_serial: sid[1].raw.to_vec(),
            signer_digest_algorithm,
            signed_attrs_embedded: si[3].raw.to_vec(),
            attributes,
            signature_algorithm: oid(&sig_alg[0]),
            signature_algorithm_params: sig_alg.get(1).map(|p| p.raw.to_vec()),
            signature: si[5].value.to_vec(),
            has_unsigned_attrs: si.len() > 6,
        }
    }

    pub fn attribute(&self, oid: &ObjectIdentifier) -> &AttributeView {
        self.attributes
            .iter()
            .find(|a| &a.oid == oid)
            .unwrap_or_else(|| panic!("attribute {oid} missing"))
    }

    /// The bytes the signature covers: `signedAttrs` re-tagged as a SET.
    pub fn signed_attrs_for_verification(&self) -> Vec<u8> {
        let mut bytes = self.signed_attrs_embedded.clone();
        bytes[0] = 0x31;
        bytes
    }

    /// Decoded `signingTime`, either encoding.
    pub fn signing_time(&self) -> SystemTime {
        let value = &self
            .attribute(&eta_signer::domain::constants::OID_SIGNING_TIME)
            .value;
        match value[0] {
            0x17 => UtcTime::from_der(value).unwrap().to_system_time(),
            0x18 => GeneralizedTime::from_der(value).unwrap().to_system_time(),
            tag => panic!("unexpected signingTime tag {tag:#x}"),
        }
    }
}
