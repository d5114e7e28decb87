//! Fuzz target: startup from arbitrary storage contents
//!
//! Fills the record store with fuzz bytes and runs `load_or_reset`,
//! verifying:
//! - No panics, including divisions by zero in the derivations
//! - The resulting settings always pass range validation
//! - The live values are consistent with the settings
//!
//! cargo fuzz run fuzz_record_load

#![no_main]

use bvm_ventilator::ControllerState;
use bvm_ventilator::adapters::eeprom::BlockStore;
use bvm_ventilator::app::ports::RecordStore;
use bvm_ventilator::config::MechanicalProfile;
use bvm_ventilator::control::derivation::LiveValues;
use bvm_ventilator::persistence::STORAGE_SIZE;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut store = BlockStore::new();
    let len = data.len().min(STORAGE_SIZE);
    if store.store(0, &data[..len]).is_err() {
        return;
    }

    let profile = MechanicalProfile::default();
    let state = match ControllerState::load_or_reset(&mut store, profile) {
        Ok(state) => state,
        Err(_) => return,
    };

    assert!(state.settings().validate().is_ok());
    assert!(state.limits().validate().is_ok());
    assert_eq!(*state.live(), LiveValues::derive(state.settings(), &profile));
});
