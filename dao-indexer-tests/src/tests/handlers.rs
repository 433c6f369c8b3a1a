#[cfg(test)]
mod tests {
    use crate::factory::{
        address, dao_created_log, dao_info_output, decode_event, deposit_log, member_added_log,
        member_removed_log, proposal_canceled_log, proposal_created_log, proposal_executed_log,
        test_indexer, vote_cast_log, watch, withdrawal_log, CREATOR_ADDRESS, DAO_ADDRESS,
        FACTORY_ADDRESS, GOVERNANCE_ADDRESS, TREASURY_ADDRESS, VOTER_ADDRESS,
    };
    use dao_indexer::handlers::{
        DaoCreatedHandler, DepositHandler, MemberAddedHandler, MemberRemovedHandler,
        ProposalCanceledHandler, ProposalCreatedHandler, ProposalExecutedHandler, VoteCastHandler,
        WithdrawalHandler,
    };
    use dao_indexer::{
        ActivityFilters, ContractKind, Dao, EventHandler, ProposalState, Repo, Support, UnsavedDao,
    };

    async fn create_dao(indexer: &crate::factory::TestIndexer) -> Dao {
        indexer
            .store
            .create_dao(&UnsavedDao::new(DAO_ADDRESS, "Acme", CREATOR_ADDRESS, 1000))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn dao_created_upserts_the_dao_once() {
        let indexer = test_indexer().await;
        indexer.reader.set_call_output(
            address(FACTORY_ADDRESS),
            dao_info_output(
                "Acme",
                address(CREATOR_ADDRESS),
                address(GOVERNANCE_ADDRESS),
                address(TREASURY_ADDRESS),
                1000,
            ),
        );

        let log = dao_created_log(
            address(FACTORY_ADDRESS),
            address(DAO_ADDRESS),
            address(CREATOR_ADDRESS),
            "Acme",
            1000,
            10,
            0,
        );
        let factory_watch = watch(FACTORY_ADDRESS, ContractKind::Factory, None);

        let context = indexer.context_for(decode_event(&log, &factory_watch));
        DaoCreatedHandler.handle_event(&context).await.unwrap();
        DaoCreatedHandler.handle_event(&context).await.unwrap();

        let daos = indexer.store.get_daos(0, 10).await.unwrap();
        assert_eq!(daos.len(), 1);
        assert_eq!(daos[0].address, DAO_ADDRESS);
        assert_eq!(daos[0].name, "Acme");
        assert_eq!(daos[0].creator, CREATOR_ADDRESS);
        assert_eq!(daos[0].created_at, 1000);

        let activities =
            indexer.store.get_activities(&ActivityFilters::default(), 0, 10).await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].kind, "DAOCreated");
    }

    #[tokio::test]
    async fn dao_created_fans_out_exactly_one_watch_per_sub_contract() {
        let indexer = test_indexer().await;
        indexer.reader.set_call_output(
            address(FACTORY_ADDRESS),
            dao_info_output(
                "Acme",
                address(CREATOR_ADDRESS),
                address(GOVERNANCE_ADDRESS),
                address(TREASURY_ADDRESS),
                1000,
            ),
        );

        let log = dao_created_log(
            address(FACTORY_ADDRESS),
            address(DAO_ADDRESS),
            address(CREATOR_ADDRESS),
            "Acme",
            1000,
            10,
            0,
        );
        let factory_watch = watch(FACTORY_ADDRESS, ContractKind::Factory, None);
        let context = indexer.context_for(decode_event(&log, &factory_watch));

        DaoCreatedHandler.handle_event(&context).await.unwrap();
        DaoCreatedHandler.handle_event(&context).await.unwrap();

        let watches = indexer.registry.list().await;
        assert_eq!(watches.len(), 3);

        let dao = indexer.store.find_dao_by_address(DAO_ADDRESS).await.unwrap().unwrap();
        for (expected_address, kind) in [
            (DAO_ADDRESS, ContractKind::Core),
            (GOVERNANCE_ADDRESS, ContractKind::Governance),
            (TREASURY_ADDRESS, ContractKind::Treasury),
        ] {
            let matching: Vec<_> = watches
                .iter()
                .filter(|w| w.kind == kind && w.address == expected_address)
                .collect();
            assert_eq!(matching.len(), 1, "expected exactly one {kind} watch");
            assert_eq!(matching[0].parent_dao_id, Some(dao.id));
        }
    }

    #[tokio::test]
    async fn proposal_created_is_idempotent() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let governance_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, Some(dao.id));

        let log = proposal_created_log(
            address(GOVERNANCE_ADDRESS),
            1,
            address(CREATOR_ADDRESS),
            "Fund grant",
            10,
            20,
            11,
            0,
        );
        let context = indexer.context_for(decode_event(&log, &governance_watch));

        ProposalCreatedHandler.handle_event(&context).await.unwrap();
        ProposalCreatedHandler.handle_event(&context).await.unwrap();

        let proposals = indexer.store.get_proposals(&dao.id, 0, 10).await.unwrap();
        assert_eq!(proposals.len(), 1);
        let proposal = &proposals[0];
        assert_eq!(proposal.proposal_id, 1);
        assert_eq!(proposal.title, "Fund grant");
        assert_eq!(proposal.state, ProposalState::Pending);
        assert_eq!(proposal.start_block, 10);
        assert_eq!(proposal.end_block, 20);
        assert_eq!(
            (proposal.for_votes, proposal.against_votes, proposal.abstain_votes),
            (0, 0, 0)
        );
    }

    #[tokio::test]
    async fn vote_cast_tallies_and_replay_leaves_state_unchanged() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let governance_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, Some(dao.id));

        let created = proposal_created_log(
            address(GOVERNANCE_ADDRESS),
            1,
            address(CREATOR_ADDRESS),
            "Fund grant",
            10,
            20,
            11,
            0,
        );
        ProposalCreatedHandler
            .handle_event(&indexer.context_for(decode_event(&created, &governance_watch)))
            .await
            .unwrap();

        let vote = vote_cast_log(
            address(GOVERNANCE_ADDRESS),
            address(VOTER_ADDRESS),
            1,
            Support::For,
            50,
            12,
            0,
        );
        let context = indexer.context_for(decode_event(&vote, &governance_watch));

        VoteCastHandler.handle_event(&context).await.unwrap();

        let proposal = indexer.store.find_proposal(&dao.id, 1).await.unwrap().unwrap();
        assert_eq!(proposal.for_votes, 50);

        // Second delivery of the identical log is recognized at the vote
        // row and skipped before the tally mutation.
        VoteCastHandler.handle_event(&context).await.unwrap();

        let proposal = indexer.store.find_proposal(&dao.id, 1).await.unwrap().unwrap();
        assert_eq!(proposal.for_votes, 50);
        assert_eq!(proposal.against_votes, 0);
        assert_eq!(proposal.abstain_votes, 0);

        let votes = indexer.store.get_votes(&proposal.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].voting_power, 50);

        let member =
            indexer.store.find_member(&dao.id, VOTER_ADDRESS).await.unwrap().unwrap();
        assert_eq!(member.voting_power, 50);
    }

    #[tokio::test]
    async fn tally_invariant_holds_across_voters_and_duplicates() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let governance_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, Some(dao.id));

        let voters = [
            (VOTER_ADDRESS, Support::For, 50u64, 12u64),
            (CREATOR_ADDRESS, Support::Against, 30, 13),
            ("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc", Support::Abstain, 20, 14),
        ];

        for (voter, support, votes, block) in voters {
            let log = vote_cast_log(
                address(GOVERNANCE_ADDRESS),
                address(voter),
                1,
                support,
                votes,
                block,
                0,
            );
            let context = indexer.context_for(decode_event(&log, &governance_watch));

            // Deliver everything twice to model at-least-once push delivery.
            VoteCastHandler.handle_event(&context).await.unwrap();
            VoteCastHandler.handle_event(&context).await.unwrap();
        }

        let proposal = indexer.store.find_proposal(&dao.id, 1).await.unwrap().unwrap();
        assert_eq!(proposal.for_votes, 50);
        assert_eq!(proposal.against_votes, 30);
        assert_eq!(proposal.abstain_votes, 20);

        let votes = indexer.store.get_votes(&proposal.id).await.unwrap();
        let tallied: i64 = votes.iter().map(|v| v.voting_power).sum();
        assert_eq!(
            proposal.for_votes + proposal.against_votes + proposal.abstain_votes,
            tallied
        );
    }

    #[tokio::test]
    async fn vote_before_proposal_creation_converges_to_in_order_state() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let governance_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, Some(dao.id));

        let vote = vote_cast_log(
            address(GOVERNANCE_ADDRESS),
            address(VOTER_ADDRESS),
            1,
            Support::For,
            50,
            12,
            0,
        );
        let created = proposal_created_log(
            address(GOVERNANCE_ADDRESS),
            1,
            address(CREATOR_ADDRESS),
            "Fund grant",
            10,
            20,
            11,
            0,
        );

        // Vote first: a placeholder proposal row carries the tally until
        // the creation event fills the descriptive fields.
        VoteCastHandler
            .handle_event(&indexer.context_for(decode_event(&vote, &governance_watch)))
            .await
            .unwrap();
        ProposalCreatedHandler
            .handle_event(&indexer.context_for(decode_event(&created, &governance_watch)))
            .await
            .unwrap();

        let proposals = indexer.store.get_proposals(&dao.id, 0, 10).await.unwrap();
        assert_eq!(proposals.len(), 1);
        let proposal = &proposals[0];
        assert_eq!(proposal.title, "Fund grant");
        assert_eq!(proposal.proposer, CREATOR_ADDRESS);
        assert_eq!(proposal.for_votes, 50);
        assert_eq!(proposal.state, ProposalState::Pending);

        let votes = indexer.store.get_votes(&proposal.id).await.unwrap();
        assert_eq!(votes.len(), 1);
    }

    #[tokio::test]
    async fn proposal_executed_records_state_without_touching_tallies() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let governance_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, Some(dao.id));

        let created = proposal_created_log(
            address(GOVERNANCE_ADDRESS),
            1,
            address(CREATOR_ADDRESS),
            "Fund grant",
            10,
            20,
            11,
            0,
        );
        let vote = vote_cast_log(
            address(GOVERNANCE_ADDRESS),
            address(VOTER_ADDRESS),
            1,
            Support::For,
            50,
            12,
            0,
        );
        let executed = proposal_executed_log(address(GOVERNANCE_ADDRESS), 1, 21, 0);

        ProposalCreatedHandler
            .handle_event(&indexer.context_for(decode_event(&created, &governance_watch)))
            .await
            .unwrap();
        VoteCastHandler
            .handle_event(&indexer.context_for(decode_event(&vote, &governance_watch)))
            .await
            .unwrap();

        let context = indexer.context_for(decode_event(&executed, &governance_watch));
        ProposalExecutedHandler.handle_event(&context).await.unwrap();
        ProposalExecutedHandler.handle_event(&context).await.unwrap();

        let proposal = indexer.store.find_proposal(&dao.id, 1).await.unwrap().unwrap();
        assert_eq!(proposal.state, ProposalState::Executed);
        assert_eq!(proposal.for_votes, 50);
    }

    #[tokio::test]
    async fn proposal_created_after_execution_keeps_the_recorded_state() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let governance_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, Some(dao.id));

        let executed = proposal_executed_log(address(GOVERNANCE_ADDRESS), 1, 21, 0);
        ProposalExecutedHandler
            .handle_event(&indexer.context_for(decode_event(&executed, &governance_watch)))
            .await
            .unwrap();

        let created = proposal_created_log(
            address(GOVERNANCE_ADDRESS),
            1,
            address(CREATOR_ADDRESS),
            "Fund grant",
            10,
            20,
            11,
            0,
        );
        ProposalCreatedHandler
            .handle_event(&indexer.context_for(decode_event(&created, &governance_watch)))
            .await
            .unwrap();

        let proposal = indexer.store.find_proposal(&dao.id, 1).await.unwrap().unwrap();
        assert_eq!(proposal.title, "Fund grant");
        assert_eq!(proposal.state, ProposalState::Executed);
    }

    #[tokio::test]
    async fn member_added_and_removed_mark_the_member() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let core_watch = watch(DAO_ADDRESS, ContractKind::Core, Some(dao.id));

        let added = member_added_log(address(DAO_ADDRESS), address(VOTER_ADDRESS), 15, 0);
        let context = indexer.context_for(decode_event(&added, &core_watch));
        MemberAddedHandler.handle_event(&context).await.unwrap();
        MemberAddedHandler.handle_event(&context).await.unwrap();

        let members = indexer.store.get_members(&dao.id, 0, 10).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].voting_power, 100);

        let removed = member_removed_log(address(DAO_ADDRESS), address(VOTER_ADDRESS), 16, 0);
        MemberRemovedHandler
            .handle_event(&indexer.context_for(decode_event(&removed, &core_watch)))
            .await
            .unwrap();

        // The row is never deleted; removal zeroes the power.
        let member = indexer.store.find_member(&dao.id, VOTER_ADDRESS).await.unwrap().unwrap();
        assert_eq!(member.voting_power, 0);

        let activities =
            indexer.store.get_activities(&ActivityFilters::default(), 0, 10).await.unwrap();
        let kinds: Vec<_> = activities.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, vec!["MemberRemoved", "MemberAdded"]);
    }

    #[tokio::test]
    async fn treasury_events_only_append_to_the_audit_trail() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let treasury_watch = watch(TREASURY_ADDRESS, ContractKind::Treasury, Some(dao.id));

        let token = "0x0000000000000000000000000000000000000000";
        let deposit = deposit_log(
            address(TREASURY_ADDRESS),
            address(CREATOR_ADDRESS),
            address(token),
            1_000,
            30,
            0,
        );
        let context = indexer.context_for(decode_event(&deposit, &treasury_watch));
        DepositHandler.handle_event(&context).await.unwrap();
        DepositHandler.handle_event(&context).await.unwrap();

        let withdrawal = withdrawal_log(
            address(TREASURY_ADDRESS),
            address(VOTER_ADDRESS),
            address(token),
            400,
            31,
            0,
        );
        WithdrawalHandler
            .handle_event(&indexer.context_for(decode_event(&withdrawal, &treasury_watch)))
            .await
            .unwrap();

        let activities =
            indexer.store.get_activities(&ActivityFilters::default(), 0, 10).await.unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].kind, "TreasuryWithdrawal");
        assert_eq!(activities[1].kind, "TreasuryDeposit");
        assert_eq!(
            activities[1].metadata,
            serde_json::json!({
                "txHash": activities[1].transaction_hash,
                "token": token,
                "amount": "1000",
            })
        );

        assert!(indexer.store.get_members(&dao.id, 0, 10).await.unwrap().is_empty());
        assert!(indexer.store.get_proposals(&dao.id, 0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn proposal_canceled_records_the_state_verbatim() {
        let indexer = test_indexer().await;
        let dao = create_dao(&indexer).await;
        let governance_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, Some(dao.id));

        let created = proposal_created_log(
            address(GOVERNANCE_ADDRESS),
            1,
            address(CREATOR_ADDRESS),
            "Fund grant",
            10,
            20,
            11,
            0,
        );
        ProposalCreatedHandler
            .handle_event(&indexer.context_for(decode_event(&created, &governance_watch)))
            .await
            .unwrap();

        let canceled = proposal_canceled_log(address(GOVERNANCE_ADDRESS), 1, 15, 0);
        ProposalCanceledHandler
            .handle_event(&indexer.context_for(decode_event(&canceled, &governance_watch)))
            .await
            .unwrap();

        let proposal = indexer.store.find_proposal(&dao.id, 1).await.unwrap().unwrap();
        assert_eq!(proposal.state, ProposalState::Canceled);
    }
}
