#[cfg(test)]
mod tests {
    use crate::factory::{
        address, dao_created_log, dao_info_output, decode_event, proposal_created_log, removed_log,
        test_indexer, vote_cast_log, watch, CREATOR_ADDRESS, DAO_ADDRESS, FACTORY_ADDRESS,
        GOVERNANCE_ADDRESS, TREASURY_ADDRESS, VOTER_ADDRESS,
    };
    use dao_indexer::ingester::{self, backfill};
    use dao_indexer::{
        ActivityFilters, CheckpointStore, ContractKind, Repo, Support, UnsavedContractWatch,
    };

    /// DAOCreated, then a proposal, then a vote, scanned end to end through
    /// batched backfill with fan-out registration happening mid-range.
    #[tokio::test]
    async fn indexes_a_dao_lifecycle_end_to_end() {
        let indexer = test_indexer().await;
        let checkpoint = CheckpointStore::new(indexer.store.clone());

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
        indexer.reader.set_block_number(20);
        indexer.reader.add_logs(vec![
            dao_created_log(
                address(FACTORY_ADDRESS),
                address(DAO_ADDRESS),
                address(CREATOR_ADDRESS),
                "Acme",
                1000,
                10,
                0,
            ),
            proposal_created_log(
                address(GOVERNANCE_ADDRESS),
                1,
                address(CREATOR_ADDRESS),
                "Fund grant",
                10,
                20,
                11,
                0,
            ),
            vote_cast_log(
                address(GOVERNANCE_ADDRESS),
                address(VOTER_ADDRESS),
                1,
                Support::For,
                50,
                12,
                0,
            ),
        ]);

        indexer
            .registry
            .watch(UnsavedContractWatch::new(
                FACTORY_ADDRESS,
                ContractKind::Factory,
                None,
                1,
            ))
            .await
            .unwrap();

        ingester::ingest_range(
            &indexer.chain_reader(),
            &indexer.registry,
            &indexer.sink,
            &checkpoint,
            1,
            20,
            10,
        )
        .await
        .unwrap();

        let daos = indexer.store.get_daos(0, 10).await.unwrap();
        assert_eq!(daos.len(), 1);
        let dao = &daos[0];
        assert_eq!(dao.address, DAO_ADDRESS);

        let proposals = indexer.store.get_proposals(&dao.id, 0, 10).await.unwrap();
        assert_eq!(proposals.len(), 1);
        let proposal = &proposals[0];
        assert_eq!(proposal.title, "Fund grant");
        assert_eq!(
            (proposal.for_votes, proposal.against_votes, proposal.abstain_votes),
            (50, 0, 0)
        );

        let members = indexer.store.get_members(&dao.id, 0, 10).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].address, VOTER_ADDRESS);
        assert_eq!(members[0].voting_power, 50);

        let votes = indexer.store.get_votes(&proposal.id).await.unwrap();
        assert_eq!(votes.len(), 1);

        let activities =
            indexer.store.get_activities(&ActivityFilters::default(), 0, 10).await.unwrap();
        let kinds: Vec<_> = activities.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, vec!["VoteCast", "ProposalCreated", "DAOCreated"]);

        assert_eq!(checkpoint.get().await.unwrap(), Some(20));

        // Re-scanning the whole range models the poll loop overlapping the
        // live listener: every event is delivered again, and nothing moves.
        backfill::run(
            &indexer.chain_reader(),
            &indexer.registry,
            &indexer.sink,
            1,
            20,
        )
        .await
        .unwrap();
        indexer.sink.flush().await.unwrap();

        let proposal = indexer.store.find_proposal(&dao.id, 1).await.unwrap().unwrap();
        assert_eq!(proposal.for_votes, 50);
        assert_eq!(indexer.store.get_votes(&proposal.id).await.unwrap().len(), 1);
        assert_eq!(
            indexer
                .store
                .get_activities(&ActivityFilters::default(), 0, 10)
                .await
                .unwrap()
                .len(),
            3
        );
    }

    #[tokio::test]
    async fn reorged_out_logs_are_not_projected() {
        let indexer = test_indexer().await;

        let log = removed_log(dao_created_log(
            address(FACTORY_ADDRESS),
            address(DAO_ADDRESS),
            address(CREATOR_ADDRESS),
            "Acme",
            1000,
            10,
            0,
        ));
        let factory_watch = watch(FACTORY_ADDRESS, ContractKind::Factory, None);

        indexer.sink.send(decode_event(&log, &factory_watch)).unwrap();
        indexer.sink.flush().await.unwrap();

        assert!(indexer.store.get_daos(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_failing_projection_does_not_abort_its_siblings() {
        let indexer = test_indexer().await;

        // No canned daoInfo output, so the DAOCreated projection fails at
        // the module-address call; the vote on an already-watched
        // governance contract must still land.
        let dao = indexer
            .store
            .create_dao(&dao_indexer::UnsavedDao::new(
                DAO_ADDRESS,
                "Acme",
                CREATOR_ADDRESS,
                1000,
            ))
            .await
            .unwrap();
        let governance_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, Some(dao.id));
        let factory_watch = watch(FACTORY_ADDRESS, ContractKind::Factory, None);

        let failing = dao_created_log(
            address(FACTORY_ADDRESS),
            address("0x00000000000000000000000000000000000000aa"),
            address(CREATOR_ADDRESS),
            "Broken",
            1000,
            10,
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

        indexer.sink.send(decode_event(&failing, &factory_watch)).unwrap();
        indexer.sink.send(decode_event(&vote, &governance_watch)).unwrap();
        indexer.sink.flush().await.unwrap();

        let proposal = indexer.store.find_proposal(&dao.id, 1).await.unwrap().unwrap();
        assert_eq!(proposal.for_votes, 50);
    }
}
