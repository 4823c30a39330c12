use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;

use crate::{
    subscription::{Subscription, SubscriptionMode},
    task::SubscriptionId,
};

/// Реестр открытых подписок, разделённый на push и pull части.
///
/// Подписка попадает ровно в одну часть по своему режиму. Чтения
/// возвращают снимок (`Vec<Arc<Subscription>>`), поэтому движок никогда
/// не держит блокировку реестра во время RPC.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    inner: RwLock<Partitions>,
}

#[derive(Debug, Default)]
struct Partitions {
    push: BTreeMap<SubscriptionId, Arc<Subscription>>,
    pull: BTreeMap<SubscriptionId, Arc<Subscription>>,
}

impl Partitions {
    fn for_mode(
        &mut self,
        mode: SubscriptionMode,
    ) -> &mut BTreeMap<SubscriptionId, Arc<Subscription>> {
        match mode {
            SubscriptionMode::Push => &mut self.push,
            SubscriptionMode::Pull => &mut self.pull,
        }
    }
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует открытую подписку. Подписка без id брокера или уже
    /// зарегистрированная не добавляется (`false`).
    pub fn add(
        &self,
        subscription: Arc<Subscription>,
    ) -> bool {
        let Some(id) = subscription.id() else {
            return false;
        };
        let mut partitions = self.inner.write();
        let partition = partitions.for_mode(subscription.mode());
        if partition.contains_key(&id) {
            return false;
        }
        partition.insert(id, subscription);
        true
    }

    /// Удаляет подписку. Повторное удаление возвращает `false`.
    pub fn remove(
        &self,
        subscription: &Subscription,
    ) -> bool {
        let Some(id) = subscription.id() else {
            return false;
        };
        self.inner
            .write()
            .for_mode(subscription.mode())
            .remove(&id)
            .is_some()
    }

    pub fn get(
        &self,
        id: SubscriptionId,
    ) -> Option<Arc<Subscription>> {
        let partitions = self.inner.read();
        partitions
            .push
            .get(&id)
            .or_else(|| partitions.pull.get(&id))
            .cloned()
    }

    /// Снимок push-подписок.
    pub fn push_managed(&self) -> Vec<Arc<Subscription>> {
        self.inner.read().push.values().cloned().collect()
    }

    /// Снимок pull-подписок.
    pub fn pollable(&self) -> Vec<Arc<Subscription>> {
        self.inner.read().pull.values().cloned().collect()
    }

    /// Снимок всех подписок, push первыми.
    pub fn all(&self) -> Vec<Arc<Subscription>> {
        let partitions = self.inner.read();
        partitions
            .push
            .values()
            .chain(partitions.pull.values())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        let partitions = self.inner.read();
        partitions.push.len() + partitions.pull.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
