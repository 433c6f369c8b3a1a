#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::factory::{
        address, deposit_log, member_added_log, test_indexer, vote_cast_log, watch,
        CREATOR_ADDRESS, DAO_ADDRESS, GOVERNANCE_ADDRESS, TREASURY_ADDRESS, VOTER_ADDRESS,
    };
    use dao_indexer::ingester::{backfill, filters, live, poll};
    use dao_indexer::{
        ActivityFilters, CheckpointStore, ContractKind, IndexerTasks, Repo, Support,
        UnsavedContractWatch, UnsavedDao,
    };
    use tokio::time::sleep;

    #[tokio::test]
    async fn backfill_feeds_events_of_one_contract_in_block_order() {
        let indexer = test_indexer().await;
        let dao = indexer
            .store
            .create_dao(&UnsavedDao::new(DAO_ADDRESS, "Acme", CREATOR_ADDRESS, 1000))
            .await
            .unwrap();
        indexer
            .registry
            .watch(UnsavedContractWatch::new(
                GOVERNANCE_ADDRESS,
                ContractKind::Governance,
                Some(dao.id),
                1,
            ))
            .await
            .unwrap();

        // Served out of order; the scanner must sort by (block, log index),
        // so the block-12 vote overwrites the member's power last.
        indexer.reader.add_logs(vec![
            vote_cast_log(
                address(GOVERNANCE_ADDRESS),
                address(VOTER_ADDRESS),
                2,
                Support::For,
                70,
                12,
                0,
            ),
            vote_cast_log(
                address(GOVERNANCE_ADDRESS),
                address(VOTER_ADDRESS),
                1,
                Support::For,
                50,
                11,
                0,
            ),
        ]);

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

        let member = indexer.store.find_member(&dao.id, VOTER_ADDRESS).await.unwrap().unwrap();
        assert_eq!(member.voting_power, 70);

        let activities =
            indexer.store.get_activities(&ActivityFilters::default(), 0, 10).await.unwrap();
        assert_eq!(activities.len(), 2);
    }

    #[tokio::test]
    async fn filters_clamp_to_the_watch_start_block() {
        let mut early_watch = watch(GOVERNANCE_ADDRESS, ContractKind::Governance, None);
        early_watch.start_block_number = 100;

        assert!(filters::get(&[early_watch.clone()], 1, 50).is_empty());

        let clamped = filters::get(&[early_watch], 1, 150);
        assert_eq!(clamped.len(), 1);
        assert_eq!(clamped[0].value.get_from_block().unwrap().as_u64(), 100);
        assert_eq!(clamped[0].value.get_to_block().unwrap().as_u64(), 150);
    }

    #[tokio::test]
    async fn poll_loop_scans_from_the_checkpoint_and_commits() {
        let indexer = test_indexer().await;
        let checkpoint = CheckpointStore::new(indexer.store.clone());
        checkpoint.commit(10).await.unwrap();

        let dao = indexer
            .store
            .create_dao(&UnsavedDao::new(DAO_ADDRESS, "Acme", CREATOR_ADDRESS, 1000))
            .await
            .unwrap();
        indexer
            .registry
            .watch(UnsavedContractWatch::new(
                DAO_ADDRESS,
                ContractKind::Core,
                Some(dao.id),
                1,
            ))
            .await
            .unwrap();

        indexer.reader.set_block_number(15);
        indexer
            .reader
            .add_logs(vec![member_added_log(address(DAO_ADDRESS), address(VOTER_ADDRESS), 12, 0)]);

        let poll_task = poll::start(
            indexer.chain_reader(),
            indexer.registry.clone(),
            indexer.sink.clone(),
            checkpoint.clone(),
            25,
            100,
        );

        for _ in 0..100 {
            if checkpoint.get().await.unwrap() == Some(15) {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(checkpoint.get().await.unwrap(), Some(15));
        let member = indexer.store.find_member(&dao.id, VOTER_ADDRESS).await.unwrap();
        assert!(member.is_some());

        // The chain advances; the next tick closes the new gap.
        indexer.reader.set_block_number(18);
        for _ in 0..100 {
            if checkpoint.get().await.unwrap() == Some(18) {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(checkpoint.get().await.unwrap(), Some(18));

        poll_task.abort();
    }

    #[tokio::test]
    async fn live_listener_projects_pushed_events_and_never_commits() {
        let mut indexer = test_indexer().await;
        let dao = indexer
            .store
            .create_dao(&UnsavedDao::new(DAO_ADDRESS, "Acme", CREATOR_ADDRESS, 1000))
            .await
            .unwrap();

        let tasks = IndexerTasks::new();
        let listener = live::start(
            indexer.chain_reader(),
            indexer.sink.clone(),
            indexer.watch_receiver.take().unwrap(),
            tasks.clone(),
        );

        let treasury_watch = indexer
            .registry
            .watch(UnsavedContractWatch::new(
                TREASURY_ADDRESS,
                ContractKind::Treasury,
                Some(dao.id),
                1,
            ))
            .await
            .unwrap()
            .unwrap();
        indexer.watch_sender.send(treasury_watch).unwrap();

        for _ in 0..100 {
            if indexer.reader.subscription_count() == 1 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(indexer.reader.subscription_count(), 1);

        let token = "0x0000000000000000000000000000000000000000";
        let deposit = deposit_log(
            address(TREASURY_ADDRESS),
            address(CREATOR_ADDRESS),
            address(token),
            1_000,
            30,
            0,
        );

        // At-least-once push delivery: the duplicate converges to one row.
        indexer.reader.push_live(deposit.clone());
        indexer.reader.push_live(deposit);

        let filters = ActivityFilters::default();
        for _ in 0..100 {
            if !indexer.store.get_activities(&filters, 0, 10).await.unwrap().is_empty() {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        indexer.sink.flush().await.unwrap();

        let activities = indexer.store.get_activities(&filters, 0, 10).await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].kind, "TreasuryDeposit");

        // Push delivery has no completeness guarantee, so no checkpoint.
        assert_eq!(indexer.store.get_checkpoint().await.unwrap(), None);

        listener.abort();
        tasks.stop().await;
    }
}
