//! The requester operations this client speaks, with their wire names and
//! the key their result element is returned under.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! operations {
    ($($variant:ident => $wire:literal : $key:literal,)+) => {
        /// A requester API operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $($variant,)+
        }

        impl Operation {
            /// Every known operation, in declaration order.
            pub const ALL: &'static [Operation] = &[$(Operation::$variant,)+];

            /// The `Operation` parameter value sent on the wire.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Operation::$variant => $wire,)+
                }
            }

            /// Key under which the response carries its result elements.
            pub fn result_key(self) -> &'static str {
                match self {
                    $(Operation::$variant => $key,)+
                }
            }
        }

        impl FromStr for Operation {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Operation::$variant),)+
                    other => Err(Error::Other(format!("unknown operation: {other}"))),
                }
            }
        }
    };
}

operations! {
    // HITs
    CreateHit => "CreateHIT" : "HIT",
    RegisterHitType => "RegisterHITType" : "RegisterHITTypeResult",
    GetHit => "GetHIT" : "HIT",
    SearchHits => "SearchHITs" : "SearchHITsResult",
    GetReviewableHits => "GetReviewableHITs" : "GetReviewableHITsResult",
    ExtendHit => "ExtendHIT" : "ExtendHITResult",
    ForceExpireHit => "ForceExpireHIT" : "ForceExpireHITResult",
    DisableHit => "DisableHIT" : "DisableHITResult",
    DisposeHit => "DisposeHIT" : "DisposeHITResult",
    SetHitAsReviewing => "SetHITAsReviewing" : "SetHITAsReviewingResult",
    ChangeHitTypeOfHit => "ChangeHITTypeOfHIT" : "ChangeHITTypeOfHITResult",
    GetAssignmentsForHit => "GetAssignmentsForHIT" : "GetAssignmentsForHITResult",
    GetBonusPayments => "GetBonusPayments" : "GetBonusPaymentsResult",
    GetReviewResultsForHit => "GetReviewResultsForHIT" : "GetReviewResultsForHITResult",

    // Workers
    BlockWorker => "BlockWorker" : "BlockWorkerResult",
    UnblockWorker => "UnblockWorker" : "UnblockWorkerResult",
    GetBlockedWorkers => "GetBlockedWorkers" : "GetBlockedWorkersResult",
    NotifyWorkers => "NotifyWorkers" : "NotifyWorkersResult",

    // Qualifications
    CreateQualificationType => "CreateQualificationType" : "QualificationType",
    GetQualificationType => "GetQualificationType" : "QualificationType",
    UpdateQualificationType => "UpdateQualificationType" : "QualificationType",
    DisposeQualificationType => "DisposeQualificationType" : "DisposeQualificationTypeResult",
    SearchQualificationTypes => "SearchQualificationTypes" : "SearchQualificationTypesResult",
    GetHitsForQualificationType => "GetHITsForQualificationType" : "GetHITsForQualificationTypeResult",
    GetQualificationsForQualificationType => "GetQualificationsForQualificationType" : "GetQualificationsForQualificationTypeResult",
    GetQualificationRequests => "GetQualificationRequests" : "GetQualificationRequestsResult",
    AssignQualification => "AssignQualification" : "AssignQualificationResult",
    GetQualificationScore => "GetQualificationScore" : "Qualification",
    UpdateQualificationScore => "UpdateQualificationScore" : "UpdateQualificationScoreResult",
    RevokeQualification => "RevokeQualification" : "RevokeQualificationResult",

    // Account
    GetAccountBalance => "GetAccountBalance" : "GetAccountBalanceResult",
    GetRequesterStatistic => "GetRequesterStatistic" : "GetStatisticResult",
    GetRequesterWorkerStatistic => "GetRequesterWorkerStatistic" : "GetStatisticResult",

    // Notifications
    SetHitTypeNotification => "SetHITTypeNotification" : "SetHITTypeNotificationResult",
    SendTestEventNotification => "SendTestEventNotification" : "SendTestEventNotificationResult",
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result key for an operation given by wire name.
///
/// Names this crate does not know fall back to `"<Name>Result"`.
pub fn result_key_for(name: &str) -> String {
    match name.parse::<Operation>() {
        Ok(op) => op.result_key().to_string(),
        Err(_) => format!("{name}Result"),
    }
}
