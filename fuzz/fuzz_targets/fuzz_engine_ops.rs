#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use agora_governance::{GovernanceEngine, LogExecutor, NewProposal};
use agora_nullables::NullStore;
use agora_types::{Address, BlockHeight, GovernanceParams, ProposalId, Tally, TokenAmount};

#[derive(Arbitrary, Debug)]
enum Op {
    SetBalance { user: u8, amount: u64 },
    Create { user: u8, title_len: u8 },
    Vote { user: u8, proposal: u8, support: bool },
    Execute { user: u8, proposal: u8 },
    Advance { blocks: u16 },
    Pause,
    Unpause,
}

fn user(n: u8) -> Address {
    Address::new(format!("user{}", n % 8))
}

// Arbitrary operation sequences must never panic, and every tally must
// always equal the count and weight sum of its recorded votes.
fuzz_target!(|ops: Vec<Op>| {
    let admin = Address::new("admin");
    let params = GovernanceParams {
        voting_period: 16,
        timelock_period: 8,
        ..GovernanceParams::default()
    };
    let Ok(mut engine) = GovernanceEngine::new(NullStore::new(), LogExecutor, admin.clone(), params)
    else {
        return;
    };
    let mut now = BlockHeight::new(0);

    for op in ops {
        let _ = match op {
            Op::SetBalance { user: u, amount } => engine
                .set_balance(&admin, &user(u), TokenAmount::new(amount))
                .map(|_| ()),
            Op::Create { user: u, title_len } => {
                let draft = NewProposal {
                    title: "t".repeat(title_len as usize),
                    description: String::new(),
                    target_contract: None,
                    action_data: None,
                };
                engine.create_proposal(&user(u), now, draft).map(|_| ())
            }
            Op::Vote { user: u, proposal, support } => engine
                .vote(&user(u), now, ProposalId::new(u64::from(proposal % 8)), support)
                .map(|_| ()),
            Op::Execute { user: u, proposal } => engine
                .execute_proposal(&user(u), now, ProposalId::new(u64::from(proposal % 8)))
                .map(|_| ()),
            Op::Advance { blocks } => {
                now = BlockHeight::new(now.get().saturating_add(u64::from(blocks)));
                Ok(())
            }
            Op::Pause => engine.pause(&admin),
            Op::Unpause => engine.unpause(&admin),
        };
    }

    let count = engine.get_proposal_count().expect("count readable");
    for id in 1..=count {
        let id = ProposalId::new(id);
        let votes = engine.votes_for_proposal(id).expect("votes readable");
        let expected = Tally::from_votes(votes.iter().map(|(_, r)| r)).expect("no overflow");
        let tally = engine.get_tally(id).expect("tally readable").unwrap_or(Tally::EMPTY);
        assert_eq!(tally, expected);

        let proposal = engine.get_proposal(id).expect("readable").expect("exists");
        let weight = proposal
            .votes_for
            .checked_add(proposal.votes_against)
            .expect("no overflow");
        assert_eq!(weight, tally.total_weight);
    }
});
