extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events, Ledger},
    token, vec, Address, Env, IntoVal, TryIntoVal,
};

use crate::{
    AdminChanged, CapMode, CapModeChanged, Crowdsale, CrowdsaleClient, SaleInitialized,
    SaleParams, TokenOwnershipTransferred, TokenPurchase,
};

const DAY: u64 = 86_400;
const START: u64 = 1_700_000_000;

struct Fixture {
    env: Env,
    client: CrowdsaleClient<'static>,
    owner: Address,
    token: Address,
    payment: token::StellarAssetClient<'static>,
    wallet: Address,
}

fn setup() -> Fixture {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|li| li.timestamp = START);

    let contract_id = env.register(Crowdsale, ());
    let client = CrowdsaleClient::new(&env, &contract_id);

    let owner = Address::generate(&env);
    let issuer = Address::generate(&env);
    let wallet = Address::generate(&env);
    let token = env.register_stellar_asset_contract_v2(issuer.clone()).address();
    let payment_token = env.register_stellar_asset_contract_v2(issuer.clone()).address();
    token::StellarAssetClient::new(&env, &token).set_admin(&contract_id);

    client.init(
        &owner,
        &SaleParams {
            start_time: START,
            end_times: vec![&env, START + 30 * DAY, START + 60 * DAY],
            rates: vec![&env, 1000u32, 800],
            token: token.clone(),
            payment_token: payment_token.clone(),
            wallet: wallet.clone(),
            cap_times: vec![&env, START + 60 * DAY],
            caps: vec![&env, 1_000_000_000i128],
        },
    );

    let payment = token::StellarAssetClient::new(&env, &payment_token);
    Fixture {
        env,
        client,
        owner,
        token,
        payment,
        wallet,
    }
}

#[test]
fn test_init_event() {
    let f = setup();

    let all_events = f.env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, f.client.address);
    let expected_topics = vec![&f.env, symbol_short!("init").into_val(&f.env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: SaleInitialized = last_event.2.try_into_val(&f.env).unwrap();
    assert_eq!(
        event_data,
        SaleInitialized {
            owner: f.owner.clone(),
            start_time: START,
            token: f.token.clone(),
            payment_token: f.payment.address.clone(),
            wallet: f.wallet.clone(),
            phases: 2,
            windows: 1,
        }
    );
}

#[test]
fn test_purchase_event() {
    let f = setup();
    f.client.unpause(&f.owner);
    let buyer = Address::generate(&f.env);
    let beneficiary = Address::generate(&f.env);
    f.payment.mint(&buyer, &500);

    f.client.buy_tokens(&buyer, &beneficiary, &500);

    let all_events = f.env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("purchase"), beneficiary)
    assert_eq!(last_event.0, f.client.address);
    let expected_topics = vec![
        &f.env,
        symbol_short!("purchase").into_val(&f.env),
        beneficiary.clone().into_val(&f.env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: TokenPurchase = last_event.2.try_into_val(&f.env).unwrap();
    assert_eq!(
        event_data,
        TokenPurchase {
            buyer: buyer.clone(),
            beneficiary: beneficiary.clone(),
            amount: 500,
            tokens: 500_000,
            phase: 0,
            window: 0,
        }
    );
}

#[test]
fn test_paused_and_unpaused_events() {
    let f = setup();

    f.client.unpause(&f.owner);
    let last_event = f.env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![&f.env, symbol_short!("unpaused").into_val(&f.env)]
    );
    let caller: Address = last_event.2.try_into_val(&f.env).unwrap();
    assert_eq!(caller, f.owner);

    f.client.pause(&f.owner);
    let last_event = f.env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![&f.env, symbol_short!("paused").into_val(&f.env)]
    );
}

#[test]
fn test_cap_mode_event() {
    let f = setup();
    f.client.set_cap_mode(&f.owner, &CapMode::Enforced);

    let last_event = f.env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![&f.env, symbol_short!("cap_mode").into_val(&f.env)]
    );
    let event_data: CapModeChanged = last_event.2.try_into_val(&f.env).unwrap();
    assert_eq!(
        event_data,
        CapModeChanged {
            caller: f.owner.clone(),
            mode: CapMode::Enforced,
        }
    );
}

#[test]
fn test_token_ownership_event() {
    let f = setup();
    let new_owner = Address::generate(&f.env);
    f.client.transfer_token_ownership(&f.owner, &new_owner);

    let all_events = f.env.events().all();
    let last_event = all_events.last().expect("No events found");
    assert_eq!(last_event.0, f.client.address);
    assert_eq!(
        last_event.1,
        vec![&f.env, symbol_short!("tok_own").into_val(&f.env)]
    );
    let event_data: TokenOwnershipTransferred = last_event.2.try_into_val(&f.env).unwrap();
    assert_eq!(
        event_data,
        TokenOwnershipTransferred {
            caller: f.owner.clone(),
            token: f.token.clone(),
            new_owner,
        }
    );
}

#[test]
fn test_admin_events() {
    let f = setup();
    let admin = Address::generate(&f.env);

    f.client.add_admin(&f.owner, &admin);
    let last_event = f.env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![
            &f.env,
            symbol_short!("adm_add").into_val(&f.env),
            admin.clone().into_val(&f.env),
        ]
    );

    f.client.remove_admin(&f.owner, &admin);
    let last_event = f.env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![
            &f.env,
            symbol_short!("adm_del").into_val(&f.env),
            admin.clone().into_val(&f.env),
        ]
    );
    let event_data: AdminChanged = last_event.2.try_into_val(&f.env).unwrap();
    assert_eq!(
        event_data,
        AdminChanged {
            caller: f.owner.clone(),
            admin: admin.clone(),
        }
    );
}
