//! Message subscriptions.
//!
//! Destination credentials are write-only: the remote returns [`MASKED`]
//! in their place, and the stored value is carried over from the prior
//! record instead.

use crate::support::{changed, ensure_unchanged, ensure_unique_keys, pinned_version};
use crate::{
    ActionContext, Creatable, Identity, Materialize, ModelError, ModelResult, RemoteModel,
    RemoteObject, Resource, UpdatePlan, MASKED,
};
use commerce_diff::{diff_keyed_with, same_members, sort_by_plan, Keyed};
use commerce_types::Attr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwsAuthenticationMode {
    #[default]
    Credentials,
    #[serde(rename = "IAM")]
    Iam,
}

/// Where messages are delivered. Secret fields hold the configured value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Destination {
    #[serde(rename = "SQS")]
    Sqs {
        queue_url: String,
        region: String,
        #[serde(default)]
        access_key: Option<String>,
        #[serde(default)]
        access_secret: Option<String>,
        #[serde(default)]
        authentication_mode: AwsAuthenticationMode,
    },
    #[serde(rename = "SNS")]
    Sns {
        topic_arn: String,
        #[serde(default)]
        access_key: Option<String>,
        #[serde(default)]
        access_secret: Option<String>,
        #[serde(default)]
        authentication_mode: AwsAuthenticationMode,
    },
    EventBridge { region: String, account_id: String },
    AzureServiceBus { connection_string: String },
    EventGrid { uri: String, access_key: String },
    GoogleCloudPubSub { project_id: String, topic: String },
}

impl Destination {
    fn to_remote(&self) -> RemoteDestination {
        match self.clone() {
            Destination::Sqs {
                queue_url,
                region,
                access_key,
                access_secret,
                authentication_mode,
            } => RemoteDestination::Sqs {
                queue_url,
                region,
                access_key,
                access_secret,
                authentication_mode,
            },
            Destination::Sns {
                topic_arn,
                access_key,
                access_secret,
                authentication_mode,
            } => RemoteDestination::Sns {
                topic_arn,
                access_key,
                access_secret,
                authentication_mode,
            },
            Destination::EventBridge { region, account_id } => {
                RemoteDestination::EventBridge { region, account_id }
            }
            Destination::AzureServiceBus { connection_string } => {
                RemoteDestination::AzureServiceBus { connection_string }
            }
            Destination::EventGrid { uri, access_key } => RemoteDestination::EventGrid { uri, access_key },
            Destination::GoogleCloudPubSub { project_id, topic } => {
                RemoteDestination::GoogleCloudPubSub { project_id, topic }
            }
        }
    }

    fn from_remote(remote: &RemoteDestination) -> Self {
        match remote.clone() {
            RemoteDestination::Sqs {
                queue_url,
                region,
                access_key,
                access_secret,
                authentication_mode,
            } => Destination::Sqs {
                queue_url,
                region,
                access_key,
                access_secret,
                authentication_mode,
            },
            RemoteDestination::Sns {
                topic_arn,
                access_key,
                access_secret,
                authentication_mode,
            } => Destination::Sns {
                topic_arn,
                access_key,
                access_secret,
                authentication_mode,
            },
            RemoteDestination::EventBridge { region, account_id } => {
                Destination::EventBridge { region, account_id }
            }
            RemoteDestination::AzureServiceBus { connection_string } => {
                Destination::AzureServiceBus { connection_string }
            }
            RemoteDestination::EventGrid { uri, access_key } => Destination::EventGrid { uri, access_key },
            RemoteDestination::GoogleCloudPubSub { project_id, topic } => {
                Destination::GoogleCloudPubSub { project_id, topic }
            }
        }
    }

    /// Replaces masked secrets with the prior record's values.
    fn carry_secrets(&mut self, prior: &Destination) {
        fn carry(slot: &mut String, prior: &str) {
            if slot == MASKED {
                *slot = prior.to_string();
            }
        }
        fn carry_opt(slot: &mut Option<String>, prior: &Option<String>) {
            if slot.as_deref() == Some(MASKED) {
                slot.clone_from(prior);
            }
        }

        match (self, prior) {
            (
                Destination::Sqs { access_secret, .. },
                Destination::Sqs {
                    access_secret: prior_secret,
                    ..
                },
            )
            | (
                Destination::Sns { access_secret, .. },
                Destination::Sns {
                    access_secret: prior_secret,
                    ..
                },
            ) => carry_opt(access_secret, prior_secret),
            (
                Destination::AzureServiceBus { connection_string },
                Destination::AzureServiceBus {
                    connection_string: prior,
                },
            ) => carry(connection_string, prior),
            (Destination::EventGrid { access_key, .. }, Destination::EventGrid { access_key: prior, .. }) => {
                carry(access_key, prior);
            }
            _ => {}
        }
    }
}

/// Payload format of delivered messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Format {
    #[default]
    Platform,
    CloudEvents {
        #[serde(rename = "cloudEventsVersion")]
        cloud_events_version: String,
    },
}

/// Message types delivered for one resource type. Empty means all types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSubscription {
    pub resource_type_id: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl Keyed for MessageSubscription {
    fn key(&self) -> &str {
        &self.resource_type_id
    }
}

impl MessageSubscription {
    fn same_types(&self, other: &Self) -> bool {
        self.resource_type_id == other.resource_type_id && same_members(&self.types, &other.types)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSubscription {
    pub resource_type_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub key: Attr<String>,
    pub destination: Destination,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub messages: Vec<MessageSubscription>,
    /// Resource type ids whose changes are delivered.
    #[serde(default)]
    pub changes: Vec<String>,
}

impl Subscription {
    pub fn new(destination: Destination) -> Self {
        Self {
            identity: Identity::default(),
            key: Attr::Null,
            destination,
            format: Format::default(),
            messages: Vec::new(),
            changes: Vec::new(),
        }
    }
}

// ── Remote shapes ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RemoteDestination {
    #[serde(rename = "SQS", rename_all = "camelCase")]
    Sqs {
        queue_url: String,
        region: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_secret: Option<String>,
        #[serde(default)]
        authentication_mode: AwsAuthenticationMode,
    },
    #[serde(rename = "SNS", rename_all = "camelCase")]
    Sns {
        topic_arn: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_secret: Option<String>,
        #[serde(default)]
        authentication_mode: AwsAuthenticationMode,
    },
    #[serde(rename_all = "camelCase")]
    EventBridge { region: String, account_id: String },
    #[serde(rename_all = "camelCase")]
    AzureServiceBus { connection_string: String },
    #[serde(rename_all = "camelCase")]
    EventGrid { uri: String, access_key: String },
    #[serde(rename_all = "camelCase")]
    GoogleCloudPubSub { project_id: String, topic: String },
}

impl RemoteDestination {
    fn mask(&mut self) {
        match self {
            RemoteDestination::Sqs { access_secret, .. } | RemoteDestination::Sns { access_secret, .. } => {
                if access_secret.is_some() {
                    *access_secret = Some(MASKED.to_string());
                }
            }
            RemoteDestination::AzureServiceBus { connection_string } => {
                *connection_string = MASKED.to_string();
            }
            RemoteDestination::EventGrid { access_key, .. } => *access_key = MASKED.to_string(),
            RemoteDestination::EventBridge { .. } | RemoteDestination::GoogleCloudPubSub { .. } => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRemote {
    pub id: String,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub destination: RemoteDestination,
    pub format: Format,
    #[serde(default)]
    pub messages: Vec<MessageSubscription>,
    #[serde(default)]
    pub changes: Vec<ChangeSubscription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub destination: RemoteDestination,
    pub format: Format,
    #[serde(default)]
    pub messages: Vec<MessageSubscription>,
    #[serde(default)]
    pub changes: Vec<ChangeSubscription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SubscriptionAction {
    SetKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    ChangeDestination {
        destination: RemoteDestination,
    },
    SetMessages {
        messages: Vec<MessageSubscription>,
    },
    SetChanges {
        changes: Vec<ChangeSubscription>,
    },
}

fn change_subscriptions(ids: &[String]) -> Vec<ChangeSubscription> {
    ids.iter()
        .map(|id| ChangeSubscription {
            resource_type_id: id.clone(),
        })
        .collect()
}

impl Resource for Subscription {
    const TYPE_NAME: &'static str = "commerce_subscription";
    const ENDPOINT: &'static str = "subscriptions";
    const SCHEMA_VERSION: u64 = 1;

    type Remote = SubscriptionRemote;
    type Action = SubscriptionAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &SubscriptionRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.id, remote.version),
            key: remote.key.clone().into(),
            destination: Destination::from_remote(&remote.destination),
            format: remote.format.clone(),
            messages: remote.messages.clone(),
            changes: remote.changes.iter().map(|c| c.resource_type_id.clone()).collect(),
        })
    }

    fn update_actions(
        &self,
        desired: &Self,
        _ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<SubscriptionAction>> {
        ensure_unchanged("format", &self.format, &desired.format)?;
        desired.validate()?;

        let mut actions = Vec::new();
        if changed(&self.key, &desired.key) {
            actions.push(SubscriptionAction::SetKey {
                key: desired.key.to_option(),
            });
        }
        if self.destination != desired.destination {
            actions.push(SubscriptionAction::ChangeDestination {
                destination: desired.destination.to_remote(),
            });
        }
        let messages = diff_keyed_with(&self.messages, &desired.messages, MessageSubscription::same_types);
        if !messages.is_empty() {
            actions.push(SubscriptionAction::SetMessages {
                messages: desired.messages.clone(),
            });
        }
        if !same_members(&self.changes, &desired.changes) {
            actions.push(SubscriptionAction::SetChanges {
                changes: change_subscriptions(&desired.changes),
            });
        }
        Ok(UpdatePlan::new(pinned_version(&self.identity.version)?, actions))
    }

    fn validate(&self) -> ModelResult<()> {
        if self.messages.is_empty() && self.changes.is_empty() {
            return Err(ModelError::invalid_input(
                "messages",
                "a subscription needs at least one message or change subscription",
            ));
        }
        ensure_unique_keys(
            "messages",
            "resource type",
            self.messages.iter().map(|m| m.resource_type_id.as_str()),
        )?;
        ensure_unique_keys("changes", "resource type", self.changes.iter().map(String::as_str))
    }

    fn align_with_plan(&mut self, plan: &Self) {
        let messages = std::mem::take(&mut self.messages);
        self.messages = sort_by_plan(plan.messages.iter().map(|m| m.resource_type_id.as_str()), messages);
        for message in &mut self.messages {
            if let Some(planned) = plan
                .messages
                .iter()
                .find(|m| m.resource_type_id == message.resource_type_id)
            {
                let types = std::mem::take(&mut message.types);
                message.types = sort_by_plan(planned.types.iter().map(String::as_str), types);
            }
        }
        let changes = std::mem::take(&mut self.changes);
        self.changes = sort_by_plan(plan.changes.iter().map(String::as_str), changes);
    }

    fn carry_secrets(&mut self, prior: &Self) {
        self.destination.carry_secrets(&prior.destination);
    }
}

impl Creatable for Subscription {
    type Draft = SubscriptionDraft;

    fn draft(&self, _ctx: &ActionContext) -> ModelResult<SubscriptionDraft> {
        self.validate()?;
        Ok(SubscriptionDraft {
            key: self.key.to_option(),
            destination: self.destination.to_remote(),
            format: self.format.clone(),
            messages: self.messages.clone(),
            changes: change_subscriptions(&self.changes),
        })
    }
}

impl RemoteObject for SubscriptionRemote {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

impl RemoteModel for SubscriptionRemote {
    type Action = SubscriptionAction;

    fn apply_action(&mut self, action: &SubscriptionAction) -> ModelResult<()> {
        match action {
            SubscriptionAction::SetKey { key } => self.key = key.clone(),
            SubscriptionAction::ChangeDestination { destination } => self.destination = destination.clone(),
            SubscriptionAction::SetMessages { messages } => self.messages = messages.clone(),
            SubscriptionAction::SetChanges { changes } => self.changes = changes.clone(),
        }
        Ok(())
    }

    fn mask_secrets(&mut self) {
        self.destination.mask();
    }
}

impl Materialize for SubscriptionRemote {
    type Draft = SubscriptionDraft;

    fn materialize(draft: SubscriptionDraft, id: String) -> ModelResult<Self> {
        Ok(Self {
            id,
            version: 1,
            key: draft.key,
            destination: draft.destination,
            format: draft.format,
            messages: draft.messages,
            changes: draft.changes,
        })
    }
}
