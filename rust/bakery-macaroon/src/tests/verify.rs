use super::fixtures::{accept, primary_and_discharge, DISCHARGE_ROOT_KEY, ROOT_KEY};
use crate::{Macaroon, MacaroonError};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

#[cfg(target_arch = "wasm32")]
wasm_bindgen_test_configure!(run_in_browser);

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_verifies_first_party_caveats_with_the_checker() {
    let mut macaroon = Macaroon::new(ROOT_KEY, b"id".to_vec(), "loc");
    macaroon.add_first_party_caveat("account = 3735928559");
    macaroon.add_first_party_caveat("time < 2035-01-01T00:00");

    macaroon
        .verify(
            ROOT_KEY,
            accept(&["account = 3735928559", "time < 2035-01-01T00:00"]),
            &[],
        )
        .unwrap();

    let error = macaroon
        .verify(ROOT_KEY, accept(&["account = 3735928559"]), &[])
        .unwrap_err();

    assert!(matches!(error, MacaroonError::CaveatNotSatisfied(_)));
    assert_eq!(
        error.to_string(),
        "condition \"time < 2035-01-01T00:00\" not met"
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_rejects_the_wrong_root_key() {
    let mut macaroon = Macaroon::new(ROOT_KEY, b"id".to_vec(), "loc");
    macaroon.add_first_party_caveat("account = 3735928559");

    let error = macaroon
        .verify(b"some other key", accept(&["account = 3735928559"]), &[])
        .unwrap_err();

    assert!(matches!(error, MacaroonError::SignatureMismatch));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_detects_caveats_that_were_edited_after_signing() {
    let mut macaroon = Macaroon::new(ROOT_KEY, b"id".to_vec(), "loc");
    macaroon.add_first_party_caveat("account = 3735928559");

    let mut json = serde_json::to_value(&macaroon).unwrap();
    json["caveats"][0]["condition"] = "account = 0".into();
    let tampered: Macaroon = serde_json::from_value(json).unwrap();

    let error = tampered
        .verify(ROOT_KEY, accept(&["account = 0"]), &[])
        .unwrap_err();

    assert!(matches!(error, MacaroonError::SignatureMismatch));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_verifies_a_bound_discharge() {
    let (primary, mut discharge) = primary_and_discharge();
    discharge.bind(primary.signature());

    primary
        .verify(
            ROOT_KEY,
            accept(&["account = 3735928559", "user = bob"]),
            &[discharge],
        )
        .unwrap();
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_checks_the_caveats_of_discharges_too() {
    let (primary, mut discharge) = primary_and_discharge();
    discharge.bind(primary.signature());

    let error = primary
        .verify(ROOT_KEY, accept(&["account = 3735928559"]), &[discharge])
        .unwrap_err();

    assert_eq!(error.to_string(), "condition \"user = bob\" not met");
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_reports_a_missing_discharge_by_caveat_id() {
    let (primary, _) = primary_and_discharge();

    let error = primary
        .verify(ROOT_KEY, accept(&["account = 3735928559"]), &[])
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "cannot find discharge macaroon for caveat \"third party caveat\""
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_rejects_unbound_and_misbound_discharges() {
    let (primary, discharge) = primary_and_discharge();
    let check = || accept(&["account = 3735928559", "user = bob"]);

    let unbound = primary
        .verify(ROOT_KEY, check(), &[discharge.clone()])
        .unwrap_err();
    assert!(matches!(unbound, MacaroonError::SignatureMismatch));

    let mut misbound = discharge;
    misbound.bind(b"tampered-signature");
    let error = primary.verify(ROOT_KEY, check(), &[misbound]).unwrap_err();
    assert!(matches!(error, MacaroonError::SignatureMismatch));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_terminates_on_cyclic_discharges() {
    let mut primary = Macaroon::new(ROOT_KEY, b"primary".to_vec(), "loc");
    primary
        .add_third_party_caveat(DISCHARGE_ROOT_KEY, b"cycle".to_vec(), "auth")
        .unwrap();

    let mut discharge = Macaroon::new(DISCHARGE_ROOT_KEY, b"cycle".to_vec(), "auth");
    discharge
        .add_third_party_caveat(DISCHARGE_ROOT_KEY, b"cycle".to_vec(), "auth")
        .unwrap();
    discharge.bind(primary.signature());

    let error = primary
        .verify(ROOT_KEY, accept(&[]), &[discharge])
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "discharge macaroon \"cycle\" was used more than once"
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_skips_a_stale_discharge_that_shares_a_caveat_id() {
    let (primary, discharge) = primary_and_discharge();
    let check = || accept(&["account = 3735928559", "user = bob"]);

    let mut stale = discharge.clone();
    stale.bind(b"the signature of some earlier macaroon");
    let mut fresh = discharge;
    fresh.bind(primary.signature());

    primary
        .verify(ROOT_KEY, check(), &[stale.clone(), fresh])
        .unwrap();

    let error = primary.verify(ROOT_KEY, check(), &[stale]).unwrap_err();
    assert!(matches!(error, MacaroonError::SignatureMismatch));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_accepts_the_primary_among_its_discharges() {
    let (primary, mut discharge) = primary_and_discharge();
    discharge.bind(primary.signature());

    let presented = vec![primary, discharge];

    presented[0]
        .verify(
            ROOT_KEY,
            accept(&["account = 3735928559", "user = bob"]),
            &presented,
        )
        .unwrap();
}
